//! Forward-chaining engine
//!
//! Runs every rule in knowledge-base order, pass after pass, until a pass
//! leaves every fact within `epsilon` of where it started (Stable) or the pass
//! cap is hit.
//!
//! Each rule contributes its latest output to its conclusion exactly once.
//! The conclusion's CF is recomputed from its pre-run value and the current
//! contributions of every rule that concludes it, so re-firing on unchanged
//! evidence never inflates belief.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::evaluate_conditions;
use crate::error::EngineResult;
use crate::knowledge::{FactStore, KnowledgeBase, Rule};
use crate::observability::{log_event, Event};

use super::certainty::{combine_all, rule_output};

/// Default cap on passes per run
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Default minimum CF change that counts as progress
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub max_passes: usize,
    pub epsilon: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Engine state between passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// At least one fact changed on the last pass
    Iterating,
    /// The last pass changed nothing
    Stable,
}

/// One rule firing, with the arithmetic that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Firing {
    pub rule_index: usize,
    pub conclusion: String,
    /// Combined premise confidence (the minimum for AND chains)
    pub condition_value: f64,
    pub rule_cf: f64,
    /// `condition_value * rule_cf`
    pub output: f64,
    /// Pass in which this output was last computed, 1-based
    pub pass: usize,
}

/// Outcome of one forward-chaining run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    /// Facts that are new or whose CF changed during the run
    pub derived: BTreeMap<String, f64>,
    pub passes: usize,
    pub reached_fixpoint: bool,
    /// Latest firing of every rule that fired, in rule order
    pub firings: Vec<Firing>,
}

impl InferenceResult {
    /// Firings that contributed to `conclusion`
    pub fn firings_for<'a>(&'a self, conclusion: &'a str) -> impl Iterator<Item = &'a Firing> {
        self.firings.iter().filter(move |f| f.conclusion == conclusion)
    }
}

/// Forward-chaining engine
#[derive(Debug, Clone, Default)]
pub struct ForwardChainer {
    config: InferenceConfig,
}

impl ForwardChainer {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Run to a fixpoint on a knowledge base, updating its facts in place
    pub fn run(&self, kb: &mut KnowledgeBase) -> EngineResult<InferenceResult> {
        let KnowledgeBase { facts, rules } = kb;
        self.run_on(facts, rules)
    }

    /// Run to a fixpoint over an explicit fact store and rule set
    pub fn run_on(&self, facts: &mut FactStore, rules: &[Rule]) -> EngineResult<InferenceResult> {
        let initial = facts.clone();
        let mut contributions: BTreeMap<usize, Firing> = BTreeMap::new();
        let mut state = EngineState::Iterating;
        let mut passes = 0;

        log_event(
            Event::InferenceStarted,
            &[
                ("facts", facts.len().to_string().as_str()),
                ("rules", rules.len().to_string().as_str()),
            ],
        );

        while state == EngineState::Iterating {
            if passes >= self.config.max_passes {
                log_event(
                    Event::PassCapReached,
                    &[("max_passes", self.config.max_passes.to_string().as_str())],
                );
                break;
            }
            passes += 1;

            let changed = self.run_pass(facts, rules, &initial, &mut contributions, passes)?;
            log_event(
                Event::PassCompleted,
                &[
                    ("pass", passes.to_string().as_str()),
                    ("changed", if changed { "true" } else { "false" }),
                ],
            );
            if !changed {
                state = EngineState::Stable;
            }
        }

        let reached_fixpoint = state == EngineState::Stable;
        if reached_fixpoint {
            log_event(Event::FixpointReached, &[("passes", passes.to_string().as_str())]);
        }

        let derived: BTreeMap<String, f64> = facts
            .iter()
            .filter(|(name, cf)| match initial.get(name) {
                Some(before) => (before - cf).abs() > self.config.epsilon,
                None => true,
            })
            .map(|(name, cf)| (name.to_string(), cf))
            .collect();

        Ok(InferenceResult {
            derived,
            passes,
            reached_fixpoint,
            firings: contributions.into_values().collect(),
        })
    }

    /// One pass over every rule. Returns whether any fact moved by more than
    /// epsilon.
    fn run_pass(
        &self,
        facts: &mut FactStore,
        rules: &[Rule],
        initial: &FactStore,
        contributions: &mut BTreeMap<usize, Firing>,
        pass: usize,
    ) -> EngineResult<bool> {
        let mut changed = false;

        for (index, rule) in rules.iter().enumerate() {
            let value = evaluate_conditions(&rule.conditions, facts).map_err(|e| e.in_rule(index))?;
            // A required fact is missing: the rule sits this pass out
            let Some(condition_value) = value else {
                continue;
            };

            let output = rule_output(condition_value, rule.cf);
            // Zero evidence never introduces a conclusion
            if output == 0.0 && !facts.contains(&rule.conclusion) {
                continue;
            }
            contributions.insert(
                index,
                Firing {
                    rule_index: index,
                    conclusion: rule.conclusion.clone(),
                    condition_value,
                    rule_cf: rule.cf,
                    output,
                    pass,
                },
            );

            let merged = combine_all(
                initial.get(&rule.conclusion),
                contributions
                    .values()
                    .filter(|f| f.conclusion == rule.conclusion)
                    .map(|f| f.output),
            )
            .unwrap_or(output);

            let previous = facts.get(&rule.conclusion);
            facts.set(&rule.conclusion, merged);

            let moved = match previous {
                Some(before) => (merged - before).abs() > self.config.epsilon,
                None => true,
            };
            if moved {
                changed = true;
                log_event(
                    Event::RuleFired,
                    &[
                        ("rule", index.to_string().as_str()),
                        ("conclusion", rule.conclusion.as_str()),
                        ("cf", format!("{:.6}", merged).as_str()),
                    ],
                );
            }
        }

        Ok(changed)
    }
}

/// Run inference on an owned knowledge base snapshot.
///
/// Returns the updated knowledge base together with the run's result.
pub fn run_inference(
    mut kb: KnowledgeBase,
    config: InferenceConfig,
) -> EngineResult<(KnowledgeBase, InferenceResult)> {
    let result = ForwardChainer::new(config).run(&mut kb)?;
    Ok((kb, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorCode;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn flu_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("fever", 0.9).unwrap();
        kb.assert_fact("cough", 0.7).unwrap();
        kb.define_rule(&["fever AND", "cough"], "flu", 0.8).unwrap();
        kb
    }

    #[test]
    fn test_single_rule_derivation() {
        let mut kb = flu_kb();
        let result = ForwardChainer::default().run(&mut kb).unwrap();

        assert!(close(result.derived["flu"], 0.56));
        assert!(close(kb.facts.get("flu").unwrap(), 0.56));
        assert!(result.reached_fixpoint);
        // one productive pass, one confirming pass
        assert_eq!(result.passes, 2);
        assert_eq!(result.derived.len(), 1);
    }

    #[test]
    fn test_refiring_does_not_double_count() {
        let mut kb = flu_kb();
        ForwardChainer::default().run(&mut kb).unwrap();
        let again = ForwardChainer::default().run(&mut kb).unwrap();

        // the second run treats flu=0.56 as its base and re-derives 0.56 once
        let expected = 0.56 + 0.56 * (1.0 - 0.56);
        assert!(close(kb.facts.get("flu").unwrap(), expected));
        assert!(again.derived.contains_key("flu"));
    }

    #[test]
    fn test_merge_into_existing_fact() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("a", 1.0).unwrap();
        kb.assert_fact("x", 0.5).unwrap();
        kb.define_rule(&["a"], "x", 0.5).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(close(result.derived["x"], 0.75));
    }

    #[test]
    fn test_two_rules_same_conclusion() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("a", 1.0).unwrap();
        kb.assert_fact("b", 1.0).unwrap();
        kb.define_rule(&["a"], "x", 0.6).unwrap();
        kb.define_rule(&["b"], "x", 0.5).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(close(result.derived["x"], 0.8));
        assert_eq!(result.firings_for("x").count(), 2);
    }

    #[test]
    fn test_chaining_across_rules() {
        let mut kb = flu_kb();
        kb.define_rule(&["flu"], "bed rest", 0.5).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(close(result.derived["bed rest"], 0.28));
    }

    #[test]
    fn test_chaining_against_rule_order() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("a", 1.0).unwrap();
        kb.define_rule(&["b"], "c", 1.0).unwrap();
        kb.define_rule(&["a"], "b", 0.5).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(close(result.derived["c"], 0.5));
        assert!(result.reached_fixpoint);
    }

    #[test]
    fn test_missing_fact_blocks_rule() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("fever", 0.9).unwrap();
        kb.define_rule(&["fever", "cough"], "flu", 0.8).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(result.derived.is_empty());
        assert!(kb.facts.get("flu").is_none());
        assert!(result.firings.is_empty());
        assert_eq!(result.passes, 1);
    }

    #[test]
    fn test_rule_without_evidence_asserts_nothing() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("sneeze", 1.0).unwrap();
        kb.define_rule(&["(fever, cough, OR)"], "flu", 0.8).unwrap();
        kb.define_rule(&["(sneeze, rash)"], "allergy", 0.9).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(result.derived.is_empty());
        assert!(result.firings.is_empty());
        assert!(!kb.facts.contains("flu"));
        assert!(!kb.facts.contains("allergy"));
    }

    #[test]
    fn test_derived_delta_uses_configured_epsilon() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("a", 1.0).unwrap();
        kb.assert_fact("x", 0.999).unwrap();
        kb.define_rule(&["a"], "x", 0.0005).unwrap();

        let config = InferenceConfig {
            max_passes: 8,
            epsilon: 0.01,
        };
        let result = ForwardChainer::new(config).run(&mut kb).unwrap();
        assert!(result.reached_fixpoint);
        assert!(result.derived.is_empty());
    }

    #[test]
    fn test_self_loop_terminates() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("A", 0.5).unwrap();
        kb.define_rule(&["A"], "A", 1.0).unwrap();

        let config = InferenceConfig {
            max_passes: 10,
            epsilon: 1e-9,
        };
        let result = ForwardChainer::new(config).run(&mut kb).unwrap();
        assert!(result.passes <= 10);
        assert!(!result.reached_fixpoint);
        let a = kb.facts.get("A").unwrap();
        assert!(a > 0.5 && a <= 1.0);
    }

    #[test]
    fn test_self_loop_converges_with_default_cap() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("A", 0.5).unwrap();
        kb.define_rule(&["A"], "A", 0.5).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(result.reached_fixpoint);
        assert!(kb.facts.get("A").unwrap() <= 1.0);
    }

    #[test]
    fn test_unchanged_facts_not_reported() {
        let mut kb = flu_kb();
        kb.assert_fact("flu", 1.0).unwrap();

        let result = ForwardChainer::default().run(&mut kb).unwrap();
        assert!(result.derived.is_empty());
    }

    #[test]
    fn test_group_error_carries_rule_index() {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("a", 1.0).unwrap();
        kb.define_rule(&["a"], "b", 1.0).unwrap();
        kb.define_rule(&["(a, b, NOT)"], "c", 1.0).unwrap();

        let err = ForwardChainer::default().run(&mut kb).unwrap_err();
        assert_eq!(err.code(), EngineErrorCode::InvalidGroupOperator);
        assert_eq!(err.rule_index(), Some(1));
    }

    #[test]
    fn test_run_inference_returns_snapshot() {
        let (kb, result) = run_inference(flu_kb(), InferenceConfig::default()).unwrap();
        assert!(kb.facts.contains("flu"));
        assert_eq!(result.firings.len(), 1);
        assert!(close(result.firings[0].condition_value, 0.7));
        assert!(close(result.firings[0].output, 0.56));
    }
}
