//! Fact store
//!
//! Name → certainty factor. Iteration is ordered by name so every listing,
//! log line and serialized document comes out the same way twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{check_confidence, EngineError, EngineResult};

/// Mapping from fact name to confidence in [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactStore {
    facts: BTreeMap<String, f64>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confidence of a fact, `None` if absent
    pub fn get(&self, name: &str) -> Option<f64> {
        self.facts.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    /// Insert or overwrite a fact.
    ///
    /// Fails with `CFR_INVALID_CONFIDENCE` for an out-of-range CF or an empty
    /// name. The store is unchanged on failure.
    pub fn assert(&mut self, name: impl Into<String>, cf: f64) -> EngineResult<()> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::empty_fact_name());
        }
        let cf = check_confidence(cf)?;
        self.facts.insert(name.to_string(), cf);
        Ok(())
    }

    /// Remove a fact, returning its last confidence
    pub fn retract(&mut self, name: &str) -> EngineResult<f64> {
        self.facts
            .remove(name)
            .ok_or_else(|| EngineError::fact_not_found(name))
    }

    /// Rename and re-weight a fact in one step
    pub fn edit(&mut self, old: &str, new: impl Into<String>, cf: f64) -> EngineResult<()> {
        if !self.contains(old) {
            return Err(EngineError::fact_not_found(old));
        }
        let new = new.into();
        let new = new.trim();
        if new.is_empty() {
            return Err(EngineError::empty_fact_name());
        }
        let cf = check_confidence(cf)?;
        self.facts.remove(old);
        self.facts.insert(new.to_string(), cf);
        Ok(())
    }

    /// Write a value the engine already computed.
    ///
    /// Only callers that derive CFs from validated inputs use this.
    pub(crate) fn set(&mut self, name: &str, cf: f64) {
        self.facts.insert(name.to_string(), cf.clamp(0.0, 1.0));
    }

    /// Check every stored value, e.g. after deserializing
    pub fn validate(&self) -> EngineResult<()> {
        for (name, cf) in &self.facts {
            if name.trim().is_empty() {
                return Err(EngineError::empty_fact_name());
            }
            check_confidence(*cf)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FactStore {
    /// Collect without validation; call `validate` on untrusted input
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
