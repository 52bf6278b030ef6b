//! Knowledge base
//!
//! Facts plus an ordered rule set, passed explicitly through every operation.
//! Each mutation touches a single fact or rule and either fully applies or
//! leaves the value untouched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::fact::FactStore;
use super::rule::Rule;

/// Facts and rules owned by one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub facts: FactStore,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a fact
    pub fn assert_fact(&mut self, name: impl Into<String>, cf: f64) -> EngineResult<&FactStore> {
        self.facts.assert(name, cf)?;
        Ok(&self.facts)
    }

    /// Rename and re-weight a fact
    pub fn edit_fact(
        &mut self,
        old: &str,
        new: impl Into<String>,
        cf: f64,
    ) -> EngineResult<&FactStore> {
        self.facts.edit(old, new, cf)?;
        Ok(&self.facts)
    }

    /// Remove a fact; `CFR_NOT_FOUND` if absent
    pub fn retract_fact(&mut self, name: &str) -> EngineResult<&FactStore> {
        self.facts.retract(name)?;
        Ok(&self.facts)
    }

    /// Parse and append a rule
    pub fn define_rule<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
        conclusion: impl Into<String>,
        cf: f64,
    ) -> EngineResult<&[Rule]> {
        let rule = Rule::define(tokens, conclusion, cf)?;
        self.rules.push(rule);
        Ok(&self.rules)
    }

    /// Replace the rule at `index`
    pub fn edit_rule<S: AsRef<str>>(
        &mut self,
        index: usize,
        tokens: &[S],
        conclusion: impl Into<String>,
        cf: f64,
    ) -> EngineResult<&[Rule]> {
        let len = self.rules.len();
        if index >= len {
            return Err(EngineError::index_out_of_range(index, len));
        }
        let rule = Rule::define(tokens, conclusion, cf).map_err(|e| e.in_rule(index))?;
        self.rules[index] = rule;
        Ok(&self.rules)
    }

    /// Remove the rule at `index`. Later rules shift down by one.
    pub fn retract_rule(&mut self, index: usize) -> EngineResult<&[Rule]> {
        let len = self.rules.len();
        if index >= len {
            return Err(EngineError::index_out_of_range(index, len));
        }
        self.rules.remove(index);
        Ok(&self.rules)
    }

    /// Every fact name the knowledge base knows about: asserted facts and
    /// names referenced in rule premises.
    pub fn catalog(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.facts.names().collect();
        for rule in &self.rules {
            names.extend(rule.referenced_facts());
        }
        names
    }

    /// Check facts and rules, e.g. after loading from storage
    pub fn validate(&self) -> EngineResult<()> {
        self.facts.validate()?;
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|e| e.in_rule(index))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorCode;
    use serde_json::json;

    fn sample() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("fever", 0.9).unwrap();
        kb.define_rule(&["fever", "cough"], "flu", 0.8).unwrap();
        kb.define_rule(&["flu"], "bed rest", 0.9).unwrap();
        kb
    }

    #[test]
    fn test_define_and_retract_rule() {
        let mut kb = sample();
        assert_eq!(kb.rules.len(), 2);

        let rules = kb.retract_rule(0).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].conclusion, "bed rest");
    }

    #[test]
    fn test_retract_rule_out_of_range() {
        let mut kb = sample();
        let err = kb.retract_rule(2).unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::IndexOutOfRange);
        assert_eq!(err.rule_index(), Some(2));
        assert_eq!(kb.rules.len(), 2);
    }

    #[test]
    fn test_edit_rule() {
        let mut kb = sample();
        kb.edit_rule(1, &["flu", "fatigue"], "bed rest", 0.7).unwrap();
        assert_eq!(kb.rules[1].conditions.len(), 2);
        assert_eq!(kb.rules[1].cf, 0.7);

        assert!(kb.edit_rule(5, &["x"], "y", 0.1).is_err());
    }

    #[test]
    fn test_failed_define_leaves_rules_untouched() {
        let mut kb = sample();
        assert!(kb.define_rule(&["(a, b"], "c", 0.5).is_err());
        assert_eq!(kb.rules.len(), 2);
    }

    #[test]
    fn test_retract_fact_not_found() {
        let mut kb = sample();
        let err = kb.retract_fact("cough").unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::NotFound);
    }

    #[test]
    fn test_catalog_includes_premise_names() {
        let kb = sample();
        let catalog: Vec<&str> = kb.catalog().into_iter().collect();
        assert_eq!(catalog, vec!["cough", "fever", "flu"]);
    }

    #[test]
    fn test_serialized_shape() {
        let kb = sample();
        let value = serde_json::to_value(&kb).unwrap();
        assert_eq!(value["facts"], json!({"fever": 0.9}));
        assert_eq!(value["rules"][0]["then"], json!("flu"));

        let back: KnowledgeBase = serde_json::from_value(value).unwrap();
        assert_eq!(back, kb);
    }

    #[test]
    fn test_validate_reports_rule_index() {
        let mut kb = sample();
        kb.rules[1].cf = 4.0;
        let err = kb.validate().unwrap_err();
        assert_eq!(err.rule_index(), Some(1));
    }
}
