//! Condition AST
//!
//! A rule's premise is an ordered list of conditions. Each condition carries a
//! trailing operator describing how it joins the next one in the list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical operator, canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    /// Map any accepted spelling to the canonical operator.
    ///
    /// Matching is case-insensitive. Russian spellings are accepted alongside
    /// the English ones.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_uppercase().as_str() {
            "AND" | "И" => Some(Operator::And),
            "OR" | "ИЛИ" => Some(Operator::Or),
            "NOT" | "НЕТ" => Some(Operator::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single condition in a rule's premise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Reference to one fact
    Atomic {
        fact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operator: Option<Operator>,
    },
    /// Parenthesized list of facts sharing one operator
    Group {
        facts: Vec<String>,
        #[serde(default = "default_group_operator")]
        group_operator: Operator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operator: Option<Operator>,
    },
}

fn default_group_operator() -> Operator {
    Operator::And
}

impl Condition {
    /// Atomic condition with no trailing operator
    pub fn atomic(fact: impl Into<String>) -> Self {
        Condition::Atomic {
            fact: fact.into(),
            operator: None,
        }
    }

    /// Group condition with no trailing operator
    pub fn group<I, S>(facts: I, group_operator: Operator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::Group {
            facts: facts.into_iter().map(Into::into).collect(),
            group_operator,
            operator: None,
        }
    }

    /// Builder-style trailing operator
    pub fn then(mut self, op: Operator) -> Self {
        self.set_trailing(Some(op));
        self
    }

    /// Operator joining this condition to the next one
    pub fn trailing(&self) -> Option<Operator> {
        match self {
            Condition::Atomic { operator, .. } | Condition::Group { operator, .. } => *operator,
        }
    }

    pub fn set_trailing(&mut self, op: Option<Operator>) {
        match self {
            Condition::Atomic { operator, .. } | Condition::Group { operator, .. } => {
                *operator = op
            }
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Condition::Group { .. })
    }

    /// Every fact name this condition references, in order
    pub fn fact_names(&self) -> Vec<&str> {
        match self {
            Condition::Atomic { fact, .. } => vec![fact.as_str()],
            Condition::Group { facts, .. } => facts.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Atomic { fact, .. } => f.write_str(fact)?,
            Condition::Group {
                facts,
                group_operator,
                ..
            } => {
                write!(f, "({}", facts.join(", "))?;
                if *group_operator != Operator::And {
                    write!(f, ", {}", group_operator)?;
                }
                f.write_str(")")?;
            }
        }
        if let Some(op) = self.trailing() {
            write!(f, " {}", op)?;
        }
        Ok(())
    }
}

/// Render a condition list back into its comma-separated text form
pub fn render_conditions(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
