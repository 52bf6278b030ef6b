//! Symptom matching
//!
//! A diagnosis query is free text: `cough, Fever: 0.7, sore throat`. Each
//! token names a symptom, optionally followed by `:cf` or `=cf`, and is
//! resolved against the knowledge base catalog.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{check_confidence, EngineError, EngineResult};

/// CF used for a symptom given without an explicit confidence
pub const DEFAULT_SYMPTOM_CF: f64 = 1.0;

fn confidence_suffix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>.+?)\s*[:=]\s*(?P<cf>[+-]?(?:\d+\.?\d*|\.\d+))$")
            .unwrap_or_else(|e| unreachable!("static pattern is valid: {}", e))
    })
}

/// One symptom as typed by the user
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomToken {
    /// Token text as it appeared in the query, trimmed
    pub raw: String,
    /// Symptom name with any confidence suffix removed
    pub name: String,
    /// Explicit confidence, if given
    pub cf: Option<f64>,
}

/// How a query token resolved against the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomMatch {
    pub token: String,
    /// Catalog fact the token resolved to, `None` when unmatched
    pub matched_fact: Option<String>,
    /// Confidence asserted for the match
    pub cf: f64,
    /// False when the match needed case folding
    pub exact: bool,
}

impl SymptomMatch {
    pub fn is_matched(&self) -> bool {
        self.matched_fact.is_some()
    }
}

/// Split a query into symptom tokens.
///
/// Fails with `CFR_EMPTY_QUERY` when nothing is left after trimming, and with
/// `CFR_INVALID_CONFIDENCE` for a suffix outside [0, 1].
pub fn parse_query(query: &str) -> EngineResult<Vec<SymptomToken>> {
    let mut tokens = Vec::new();

    for raw in query.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let token = match confidence_suffix().captures(raw) {
            Some(caps) => {
                let cf_text = &caps["cf"];
                let cf: f64 = cf_text
                    .parse()
                    .map_err(|_| EngineError::unparsable_confidence(cf_text))?;
                SymptomToken {
                    raw: raw.to_string(),
                    name: caps["name"].trim().to_string(),
                    cf: Some(check_confidence(cf)?),
                }
            }
            None => SymptomToken {
                raw: raw.to_string(),
                name: raw.to_string(),
                cf: None,
            },
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(EngineError::empty_query());
    }
    Ok(tokens)
}

/// Resolve a symptom name: exact match first, then case-insensitive
pub fn match_symptom<'c>(name: &str, catalog: &BTreeSet<&'c str>) -> Option<(&'c str, bool)> {
    if let Some(found) = catalog.get(name) {
        return Some((*found, true));
    }
    let folded = name.to_lowercase();
    catalog
        .iter()
        .find(|candidate| candidate.to_lowercase() == folded)
        .map(|found| (*found, false))
}

/// Resolve every token of a parsed query
pub fn match_tokens(tokens: &[SymptomToken], catalog: &BTreeSet<&str>) -> Vec<SymptomMatch> {
    tokens
        .iter()
        .map(|token| {
            let resolved = match_symptom(&token.name, catalog);
            SymptomMatch {
                token: token.raw.clone(),
                matched_fact: resolved.map(|(fact, _)| fact.to_string()),
                cf: token.cf.unwrap_or(DEFAULT_SYMPTOM_CF),
                exact: resolved.map_or(false, |(_, exact)| exact),
            }
        })
        .collect()
}
