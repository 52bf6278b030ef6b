//! Production rules
//!
//! `if <conditions> then <conclusion>` weighted by a rule CF. Rules have no
//! identity of their own; they are addressed by position in the rule set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::{parse_conditions, render_conditions, Condition};
use crate::error::{check_confidence, EngineError, EngineResult};

/// A single weighted rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Premise, evaluated left to right
    #[serde(rename = "if")]
    pub conditions: Vec<Condition>,
    /// Fact derived when the premise holds
    #[serde(rename = "then")]
    pub conclusion: String,
    /// Reliability of the rule itself
    pub cf: f64,
}

impl Rule {
    /// Build a rule from already parsed conditions
    pub fn new(
        conditions: Vec<Condition>,
        conclusion: impl Into<String>,
        cf: f64,
    ) -> EngineResult<Self> {
        let rule = Self {
            conditions,
            conclusion: conclusion.into().trim().to_string(),
            cf,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Parse raw premise tokens and build a rule
    pub fn define<S: AsRef<str>>(
        tokens: &[S],
        conclusion: impl Into<String>,
        cf: f64,
    ) -> EngineResult<Self> {
        let conditions = parse_conditions(tokens)?;
        Self::new(conditions, conclusion, cf)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.conditions.is_empty() {
            return Err(EngineError::empty_condition("Rule has no conditions"));
        }
        for condition in &self.conditions {
            if let Condition::Group { facts, .. } = condition {
                if facts.is_empty() {
                    return Err(EngineError::empty_condition("Group has no facts"));
                }
            }
            if condition.fact_names().iter().any(|n| n.trim().is_empty()) {
                return Err(EngineError::empty_condition(format!(
                    "Empty fact name in condition '{}'",
                    condition
                )));
            }
        }
        if let Some(last) = self.conditions.last() {
            if let Some(op) = last.trailing() {
                return Err(EngineError::malformed(
                    last.to_string(),
                    &format!("last condition cannot end with {}", op),
                ));
            }
        }
        if self.conclusion.trim().is_empty() {
            return Err(EngineError::empty_condition("Rule conclusion is empty"));
        }
        check_confidence(self.cf)?;
        Ok(())
    }

    /// Distinct fact names referenced by the premise, first occurrence order
    pub fn referenced_facts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.conditions.iter().flat_map(Condition::fact_names) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Premise rendered back to its text form
    pub fn premise_text(&self) -> String {
        render_conditions(&self.conditions)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IF {} THEN {} (CF {})",
            self.premise_text(),
            self.conclusion,
            self.cf
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Operator;
    use crate::error::EngineErrorCode;
    use serde_json::json;

    #[test]
    fn test_define_parses_premise() {
        let rule = Rule::define(&["fever", "cough"], "flu", 0.8).unwrap();
        assert_eq!(rule.conditions.len(), 2);
        assert_eq!(rule.conditions[0].trailing(), Some(Operator::And));
        assert_eq!(rule.conclusion, "flu");
    }

    #[test]
    fn test_define_rejects_bad_cf() {
        let err = Rule::define(&["fever"], "flu", 1.2).unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::InvalidConfidence);
    }

    #[test]
    fn test_define_rejects_empty_conclusion() {
        let err = Rule::define(&["fever"], "  ", 0.5).unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::EmptyCondition);
    }

    #[test]
    fn test_define_propagates_parse_errors() {
        let err = Rule::define(&["(fever"], "flu", 0.5).unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::MalformedExpression);
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let rule = Rule {
            conditions: vec![Condition::group(Vec::<String>::new(), Operator::And)],
            conclusion: "x".to_string(),
            cf: 0.9,
        };
        let err = rule.validate().unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::EmptyCondition);
    }

    #[test]
    fn test_validate_rejects_dangling_operator() {
        let rule = Rule {
            conditions: vec![Condition::atomic("a").then(Operator::Or)],
            conclusion: "x".to_string(),
            cf: 0.9,
        };
        let err = rule.validate().unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::MalformedExpression);
    }

    #[test]
    fn test_referenced_facts_are_distinct() {
        let rule = Rule::define(&["a", "(a, b, OR)", "c"], "d", 1.0).unwrap();
        assert_eq!(rule.referenced_facts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_display() {
        let rule = Rule::define(&["fever", "cough"], "flu", 0.8).unwrap();
        assert_eq!(rule.to_string(), "IF fever AND, cough THEN flu (CF 0.8)");
    }

    #[test]
    fn test_serde_field_names() {
        let rule = Rule::define(&["fever"], "flu", 0.5).unwrap();
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["then"], json!("flu"));
        assert_eq!(value["if"][0]["fact"], json!("fever"));
        assert_eq!(value["cf"], json!(0.5));
    }
}
