//! Certainty-factor arithmetic
//!
//! Confidences live in [0, 1]. Two independent pieces of evidence for the same
//! fact combine as `e + r * (1 - e)`, which is commutative, associative and
//! never exceeds 1.

/// Combine existing belief `existing` with new evidence `evidence`
pub fn combine(existing: f64, evidence: f64) -> f64 {
    existing + evidence * (1.0 - existing)
}

/// Fold a base belief and any number of contributions.
///
/// Returns `None` only when there is neither a base nor a contribution.
pub fn combine_all<I>(base: Option<f64>, contributions: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    contributions
        .into_iter()
        .fold(base, |acc, evidence| match acc {
            None => Some(evidence),
            Some(existing) => Some(combine(existing, evidence)),
        })
}

/// Strength of a single rule firing: premise confidence times rule reliability
pub fn rule_output(condition_value: f64, rule_cf: f64) -> f64 {
    condition_value * rule_cf
}
