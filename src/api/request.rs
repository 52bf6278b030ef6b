//! Session API request types
//!
//! One JSON object per request, discriminated by `op`:
//!
//! ```json
//! {"op": "assert_fact", "name": "fever", "cf": 0.9}
//! {"op": "define_rule", "if": ["fever AND", "cough"], "then": "flu", "cf": 0.8}
//! {"op": "diagnose", "query": "fever, cough: 0.7"}
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::condition::split_top_level;
use crate::error::EngineError;

use super::errors::{ApiError, ApiResult};

/// Rule definition payload shared by `define_rule` and `edit_rule`
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    /// Raw premise tokens, parsed by the condition parser
    pub tokens: Vec<String>,
    pub conclusion: String,
    pub cf: f64,
}

/// Parsed request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    AssertFact { name: String, cf: f64 },
    EditFact { old: String, new: String, cf: f64 },
    RetractFact { name: String },
    DefineRule(RuleSpec),
    EditRule { index: usize, rule: RuleSpec },
    RetractRule { index: usize },
    Infer,
    Diagnose { query: String },
    State,
    Load { id: String },
    Save { id: Option<String> },
    List,
    Delete { id: String },
}

/// Premise as a token list or as one comma-separated string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPremise {
    Tokens(Vec<String>),
    Text(String),
}

impl RawPremise {
    fn into_tokens(self) -> Vec<String> {
        match self {
            RawPremise::Tokens(tokens) => tokens,
            RawPremise::Text(text) => split_top_level(&text),
        }
    }
}

/// Raw request for parsing
#[derive(Debug, Clone, Deserialize)]
struct RawRequest {
    op: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    new_name: Option<String>,
    #[serde(default)]
    cf: Option<Value>,
    #[serde(default, rename = "if")]
    premise: Option<RawPremise>,
    #[serde(default, rename = "then")]
    conclusion: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl RawRequest {
    fn name(&mut self) -> ApiResult<String> {
        self.name.take().ok_or_else(|| ApiError::missing_field("name"))
    }

    fn index(&self) -> ApiResult<usize> {
        self.index.ok_or_else(|| ApiError::missing_field("index"))
    }

    fn id(&mut self) -> ApiResult<String> {
        self.id.take().ok_or_else(|| ApiError::missing_field("id"))
    }

    /// CF as a JSON number, or a string holding one
    fn cf(&self) -> ApiResult<f64> {
        match &self.cf {
            None => Err(ApiError::missing_field("cf")),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| EngineError::unparsable_confidence(n.to_string()).into()),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| EngineError::unparsable_confidence(s.as_str()).into()),
            Some(other) => Err(EngineError::unparsable_confidence(other.to_string()).into()),
        }
    }

    fn rule(&mut self) -> ApiResult<RuleSpec> {
        let tokens = self
            .premise
            .take()
            .ok_or_else(|| ApiError::missing_field("if"))?
            .into_tokens();
        let conclusion = self
            .conclusion
            .take()
            .ok_or_else(|| ApiError::missing_field("then"))?;
        let cf = self.cf()?;
        Ok(RuleSpec {
            tokens,
            conclusion,
            cf,
        })
    }
}

impl Request {
    /// Parse a request from a JSON string
    pub fn parse(json: &str) -> ApiResult<Self> {
        let mut raw: RawRequest = serde_json::from_str(json)
            .map_err(|e| ApiError::invalid_request(format!("Invalid JSON: {}", e)))?;

        let request = match raw.op.as_str() {
            "assert_fact" => Request::AssertFact {
                name: raw.name()?,
                cf: raw.cf()?,
            },
            "edit_fact" => Request::EditFact {
                old: raw.name()?,
                new: raw
                    .new_name
                    .take()
                    .ok_or_else(|| ApiError::missing_field("new_name"))?,
                cf: raw.cf()?,
            },
            "retract_fact" => Request::RetractFact { name: raw.name()? },
            "define_rule" => Request::DefineRule(raw.rule()?),
            "edit_rule" => Request::EditRule {
                index: raw.index()?,
                rule: raw.rule()?,
            },
            "retract_rule" => Request::RetractRule {
                index: raw.index()?,
            },
            "infer" => Request::Infer,
            "diagnose" => Request::Diagnose {
                query: raw
                    .query
                    .take()
                    .ok_or_else(|| ApiError::missing_field("query"))?,
            },
            "state" => Request::State,
            "load" => Request::Load { id: raw.id()? },
            "save" => Request::Save { id: raw.id.take() },
            "list" => Request::List,
            "delete" => Request::Delete { id: raw.id()? },
            other => return Err(ApiError::unknown_operation(other)),
        };
        Ok(request)
    }

    /// Operation name, as it appears in `op`
    pub fn op(&self) -> &'static str {
        match self {
            Request::AssertFact { .. } => "assert_fact",
            Request::EditFact { .. } => "edit_fact",
            Request::RetractFact { .. } => "retract_fact",
            Request::DefineRule(_) => "define_rule",
            Request::EditRule { .. } => "edit_rule",
            Request::RetractRule { .. } => "retract_rule",
            Request::Infer => "infer",
            Request::Diagnose { .. } => "diagnose",
            Request::State => "state",
            Request::Load { .. } => "load",
            Request::Save { .. } => "save",
            Request::List => "list",
            Request::Delete { .. } => "delete",
        }
    }
}
