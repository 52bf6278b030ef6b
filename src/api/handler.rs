//! Session request handler
//!
//! A session owns exactly one knowledge base and applies requests to it one
//! at a time. Every mutation either applies fully or leaves the knowledge
//! base as it was, so a rejected request never needs rolling back.

use serde_json::{json, Value};

use crate::diagnosis::{run_diagnosis, DiagnosisConfig};
use crate::inference::ForwardChainer;
use crate::knowledge::KnowledgeBase;
use crate::observability::{log_event, Event};
use crate::store::{normalize_id, KnowledgeBaseStore};

use super::errors::{ApiError, ApiResult};
use super::request::{Request, RuleSpec};
use super::response::Response;

/// A single-user session over one knowledge base
#[derive(Debug)]
pub struct Session {
    kb: KnowledgeBase,
    store: Option<Box<dyn KnowledgeBaseStore>>,
    /// Id the knowledge base was last loaded from or saved to
    current_id: Option<String>,
    config: DiagnosisConfig,
    handled: usize,
}

impl Session {
    pub fn new(kb: KnowledgeBase, config: DiagnosisConfig) -> Self {
        log_event(
            Event::SessionStarted,
            &[
                ("facts", kb.facts.len().to_string().as_str()),
                ("rules", kb.rules.len().to_string().as_str()),
            ],
        );
        Self {
            kb,
            store: None,
            current_id: None,
            config,
            handled: 0,
        }
    }

    /// Attach a store for `load`, `save`, `list` and `delete`
    pub fn with_store(mut self, store: Box<dyn KnowledgeBaseStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// Handle a raw JSON request string
    pub fn handle(&mut self, json_request: &str) -> Response {
        self.handled += 1;

        let mut op = "unparsed";
        let result = match Request::parse(json_request) {
            Ok(request) => {
                op = request.op();
                self.dispatch(request)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => Response::success(data),
            Err(e) => {
                log_event(
                    Event::RequestRejected,
                    &[("op", op), ("code", e.code()), ("message", e.message())],
                );
                Response::error(&e)
            }
        }
    }

    /// Apply a parsed request
    pub fn dispatch(&mut self, request: Request) -> ApiResult<Value> {
        match request {
            Request::AssertFact { name, cf } => {
                let facts = self.kb.assert_fact(name, cf)?;
                Ok(json!({ "facts": facts }))
            }
            Request::EditFact { old, new, cf } => {
                let facts = self.kb.edit_fact(&old, new, cf)?;
                Ok(json!({ "facts": facts }))
            }
            Request::RetractFact { name } => {
                let facts = self.kb.retract_fact(&name)?;
                Ok(json!({ "facts": facts }))
            }
            Request::DefineRule(RuleSpec {
                tokens,
                conclusion,
                cf,
            }) => {
                let rules = self.kb.define_rule(&tokens, conclusion, cf)?;
                Ok(json!({ "rules": rules }))
            }
            Request::EditRule { index, rule } => {
                let rules = self.kb.edit_rule(index, &rule.tokens, rule.conclusion, rule.cf)?;
                Ok(json!({ "rules": rules }))
            }
            Request::RetractRule { index } => {
                let rules = self.kb.retract_rule(index)?;
                Ok(json!({ "rules": rules }))
            }
            Request::Infer => self.handle_infer(),
            Request::Diagnose { query } => {
                let report = run_diagnosis(&self.kb, &query, self.config)?;
                to_data(&report)
            }
            Request::State => to_data(&self.kb),
            Request::Load { id } => self.handle_load(&id),
            Request::Save { id } => self.handle_save(id),
            Request::List => {
                let ids = self.store()?.list()?;
                Ok(json!({ "knowledge_bases": ids }))
            }
            Request::Delete { id } => {
                self.store()?.delete(&id)?;
                Ok(json!({ "deleted": id }))
            }
        }
    }

    /// Run to a fixpoint. The session's facts are replaced only when the
    /// whole run succeeds.
    fn handle_infer(&mut self) -> ApiResult<Value> {
        let mut facts = self.kb.facts.clone();
        let result = ForwardChainer::new(self.config.inference).run_on(&mut facts, &self.kb.rules)?;
        self.kb.facts = facts;

        Ok(json!({
            "derived": result.derived,
            "passes": result.passes,
            "reached_fixpoint": result.reached_fixpoint,
            "firings": result.firings,
            "facts": self.kb.facts,
        }))
    }

    fn handle_load(&mut self, id: &str) -> ApiResult<Value> {
        let kb = self.store()?.load(id)?;
        let normalized = normalize_id(id)?;
        self.kb = kb;
        self.current_id = Some(normalized.clone());
        Ok(json!({
            "id": normalized,
            "facts": self.kb.facts.len(),
            "rules": self.kb.rules.len(),
        }))
    }

    fn handle_save(&mut self, id: Option<String>) -> ApiResult<Value> {
        let id = id
            .or_else(|| self.current_id.clone())
            .ok_or_else(|| ApiError::missing_field("id"))?;
        let saved = self.store()?.save(&id, &self.kb)?;
        self.current_id = Some(saved.clone());
        Ok(json!({ "saved": saved }))
    }

    fn store(&self) -> ApiResult<&dyn KnowledgeBaseStore> {
        self.store.as_deref().ok_or_else(ApiError::no_store)
    }

    /// Number of requests handled so far
    pub fn handled(&self) -> usize {
        self.handled
    }

    /// Close the session, returning its knowledge base
    pub fn finish(self) -> KnowledgeBase {
        log_event(
            Event::SessionEnded,
            &[("requests", self.handled.to_string().as_str())],
        );
        self.kb
    }
}

fn to_data<T: serde::Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::invalid_request(format!("Failed to serialize response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonDirectoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn session() -> Session {
        Session::new(KnowledgeBase::new(), DiagnosisConfig::default())
    }

    fn ok(session: &mut Session, request: Value) -> Value {
        let response = session.handle(&request.to_string());
        match response {
            Response::Success(r) => r.data,
            Response::Error(e) => panic!("request {} failed: {:?}", request, e),
        }
    }

    fn err_code(session: &mut Session, request: Value) -> String {
        match session.handle(&request.to_string()) {
            Response::Error(e) => e.code,
            Response::Success(r) => panic!("request {} succeeded: {:?}", request, r),
        }
    }

    fn build_flu(session: &mut Session) {
        ok(session, json!({"op": "assert_fact", "name": "fever", "cf": 0.9}));
        ok(session, json!({"op": "assert_fact", "name": "cough", "cf": 0.7}));
        ok(
            session,
            json!({"op": "define_rule", "if": ["fever AND", "cough"], "then": "flu", "cf": 0.8}),
        );
    }

    #[test]
    fn test_fact_operations() {
        let mut s = session();
        let data = ok(&mut s, json!({"op": "assert_fact", "name": "fever", "cf": 0.9}));
        assert_eq!(data, json!({"facts": {"fever": 0.9}}));

        let data = ok(
            &mut s,
            json!({"op": "edit_fact", "name": "fever", "new_name": "high fever", "cf": 0.5}),
        );
        assert_eq!(data, json!({"facts": {"high fever": 0.5}}));

        let data = ok(&mut s, json!({"op": "retract_fact", "name": "high fever"}));
        assert_eq!(data, json!({"facts": {}}));

        assert_eq!(
            err_code(&mut s, json!({"op": "retract_fact", "name": "high fever"})),
            "CFR_NOT_FOUND"
        );
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let mut s = session();
        assert_eq!(
            err_code(&mut s, json!({"op": "assert_fact", "name": "fever", "cf": 1.5})),
            "CFR_INVALID_CONFIDENCE"
        );
        assert_eq!(
            err_code(&mut s, json!({"op": "assert_fact", "name": " ", "cf": 0.5})),
            "CFR_INVALID_CONFIDENCE"
        );
        assert!(s.knowledge_base().facts.is_empty());
    }

    #[test]
    fn test_rule_operations() {
        let mut s = session();
        build_flu(&mut s);
        assert_eq!(s.knowledge_base().rules.len(), 1);

        let data = ok(
            &mut s,
            json!({"op": "edit_rule", "index": 0, "if": "fever", "then": "cold", "cf": 0.4}),
        );
        assert_eq!(data["rules"][0]["then"], "cold");

        assert_eq!(
            err_code(&mut s, json!({"op": "retract_rule", "index": 3})),
            "CFR_INDEX_OUT_OF_RANGE"
        );
        assert_eq!(
            err_code(&mut s, json!({"op": "define_rule", "if": ["(a, b"], "then": "c", "cf": 0.5})),
            "CFR_MALFORMED_EXPRESSION"
        );

        let data = ok(&mut s, json!({"op": "retract_rule", "index": 0}));
        assert_eq!(data, json!({"rules": []}));
    }

    #[test]
    fn test_infer_updates_session() {
        let mut s = session();
        build_flu(&mut s);

        let data = ok(&mut s, json!({"op": "infer"}));
        let flu = data["derived"]["flu"].as_f64().unwrap();
        assert!((flu - 0.56).abs() < 1e-9);
        assert_eq!(data["reached_fixpoint"], true);
        assert!(s.knowledge_base().facts.contains("flu"));
    }

    #[test]
    fn test_failed_infer_keeps_facts() {
        let mut s = session();
        ok(&mut s, json!({"op": "assert_fact", "name": "a", "cf": 1.0}));
        ok(&mut s, json!({"op": "define_rule", "if": ["a"], "then": "b", "cf": 1.0}));
        ok(&mut s, json!({"op": "define_rule", "if": ["(a, b, NOT)"], "then": "c", "cf": 1.0}));

        let response = s.handle(&json!({"op": "infer"}).to_string());
        match response {
            Response::Error(e) => {
                assert_eq!(e.code, "CFR_INVALID_GROUP_OPERATOR");
                assert_eq!(e.rule_index, Some(1));
            }
            other => panic!("expected error, got {:?}", other),
        }
        assert!(!s.knowledge_base().facts.contains("b"));
    }

    #[test]
    fn test_diagnose_leaves_state() {
        let mut s = session();
        ok(
            &mut s,
            json!({"op": "define_rule", "if": ["fever", "cough"], "then": "flu", "cf": 0.8}),
        );
        let before = s.knowledge_base().clone();

        let data = ok(&mut s, json!({"op": "diagnose", "query": "fever, cough, rash"}));
        assert_eq!(data["diagnoses"][0]["conclusion"], "flu");
        assert_eq!(data["symptoms"][2]["matched_fact"], Value::Null);
        assert_eq!(s.knowledge_base(), &before);

        assert_eq!(
            err_code(&mut s, json!({"op": "diagnose", "query": ""})),
            "CFR_EMPTY_QUERY"
        );
    }

    #[test]
    fn test_state() {
        let mut s = session();
        build_flu(&mut s);
        let data = ok(&mut s, json!({"op": "state"}));
        assert_eq!(data["facts"], json!({"cough": 0.7, "fever": 0.9}));
        assert_eq!(data["rules"][0]["cf"], 0.8);
    }

    #[test]
    fn test_storage_without_store() {
        let mut s = session();
        assert_eq!(err_code(&mut s, json!({"op": "list"})), "CFR_NO_STORE");
    }

    #[test]
    fn test_storage_operations() {
        let temp = TempDir::new().unwrap();
        let store = JsonDirectoryStore::open(temp.path()).unwrap();
        let mut s = session().with_store(Box::new(store));
        build_flu(&mut s);

        assert_eq!(
            err_code(&mut s, json!({"op": "save"})),
            "CFR_INVALID_REQUEST"
        );
        let data = ok(&mut s, json!({"op": "save", "id": "clinic"}));
        assert_eq!(data, json!({"saved": "clinic.json"}));
        assert_eq!(s.current_id(), Some("clinic.json"));

        let data = ok(&mut s, json!({"op": "list"}));
        assert_eq!(data, json!({"knowledge_bases": ["clinic.json"]}));

        ok(&mut s, json!({"op": "retract_rule", "index": 0}));
        let data = ok(&mut s, json!({"op": "load", "id": "clinic"}));
        assert_eq!(data["rules"], 1);
        assert_eq!(s.knowledge_base().rules.len(), 1);

        assert_eq!(
            err_code(&mut s, json!({"op": "load", "id": "../secret"})),
            "CFR_INVALID_NAME"
        );

        ok(&mut s, json!({"op": "delete", "id": "clinic.json"}));
        assert_eq!(
            err_code(&mut s, json!({"op": "load", "id": "clinic"})),
            "CFR_NOT_FOUND"
        );
    }

    #[test]
    fn test_finish_returns_state() {
        let mut s = session();
        build_flu(&mut s);
        assert_eq!(s.handled(), 3);
        let kb = s.finish();
        assert_eq!(kb.facts.len(), 2);
    }
}
