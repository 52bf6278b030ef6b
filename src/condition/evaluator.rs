//! Condition evaluator
//!
//! Resolves conditions against a fact store.
//!
//! - atomic: the fact's CF, or `None` when the fact is absent
//! - group: members combined by the group operator, absent members count as 0
//! - list: folded left to right using each condition's trailing operator

use crate::error::{EngineError, EngineResult};
use crate::knowledge::FactStore;

use super::ast::{Condition, Operator};

/// Evaluate a single condition.
///
/// Returns `Ok(None)` only for an atomic condition whose fact is absent.
pub fn evaluate(condition: &Condition, facts: &FactStore) -> EngineResult<Option<f64>> {
    match condition {
        Condition::Atomic { fact, .. } => Ok(facts.get(fact)),
        Condition::Group {
            facts: members,
            group_operator,
            ..
        } => evaluate_group(members, *group_operator, facts).map(Some),
    }
}

fn evaluate_group(members: &[String], op: Operator, facts: &FactStore) -> EngineResult<f64> {
    let values = members.iter().map(|m| facts.get(m).unwrap_or(0.0));

    match op {
        Operator::And => Ok(values.fold(1.0, f64::min)),
        Operator::Or => Ok(values.fold(0.0, f64::max)),
        Operator::Not => match members {
            [single] => Ok(1.0 - facts.get(single).unwrap_or(0.0)),
            _ => Err(EngineError::invalid_group_operator(members.len())),
        },
    }
}

/// Whether an absent fact in position `index` prevents the rule from firing.
///
/// Groups never block. An atomic blocks unless it sits on either side of an
/// OR, or is negated by the previous condition.
pub fn is_required(conditions: &[Condition], index: usize) -> bool {
    let Some(condition) = conditions.get(index) else {
        return false;
    };
    if condition.is_group() {
        return false;
    }
    let incoming = index
        .checked_sub(1)
        .and_then(|prev| conditions[prev].trailing());
    if matches!(incoming, Some(Operator::Or) | Some(Operator::Not)) {
        return false;
    }
    condition.trailing() != Some(Operator::Or)
}

/// Whether the condition at `index` is negated by its predecessor
pub fn is_negated(conditions: &[Condition], index: usize) -> bool {
    index
        .checked_sub(1)
        .and_then(|prev| conditions.get(prev))
        .and_then(Condition::trailing)
        == Some(Operator::Not)
}

/// Whether any fact the condition names is in the store
fn has_evidence(condition: &Condition, facts: &FactStore) -> bool {
    condition.fact_names().iter().any(|name| facts.contains(name))
}

/// Evaluate a rule premise.
///
/// Returns `Ok(None)` when a required fact is absent, or when no fact the
/// premise names is present at all, meaning the rule must not fire.
/// Otherwise returns the combined confidence of the whole list.
pub fn evaluate_conditions(
    conditions: &[Condition],
    facts: &FactStore,
) -> EngineResult<Option<f64>> {
    let mut running: Option<f64> = None;
    let mut joiner: Option<Operator> = None;
    let mut evidence = false;

    for (index, condition) in conditions.iter().enumerate() {
        evidence |= has_evidence(condition, facts);
        let value = match evaluate(condition, facts)? {
            Some(v) => v,
            None if is_required(conditions, index) => return Ok(None),
            None => 0.0,
        };

        running = Some(match (running, joiner) {
            (None, _) => value,
            (Some(acc), Some(Operator::Or)) => acc.max(value),
            (Some(acc), Some(Operator::Not)) => acc.min(1.0 - value),
            (Some(acc), _) => acc.min(value),
        });
        joiner = condition.trailing();
    }

    match running {
        Some(value) if evidence => Ok(Some(value)),
        Some(_) => Ok(None),
        None => Err(EngineError::empty_condition("Condition list is empty")),
    }
}
