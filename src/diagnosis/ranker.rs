//! Diagnosis ranking
//!
//! Symptoms from the query are asserted into a scratch copy of the fact
//! store, the engine runs to a fixpoint there, and every derived conclusion
//! becomes a ranked diagnosis. The caller's knowledge base is never touched.

use serde::{Deserialize, Serialize};

use crate::condition::is_negated;
use crate::error::EngineResult;
use crate::inference::{ForwardChainer, InferenceConfig, InferenceResult};
use crate::knowledge::{FactStore, KnowledgeBase, Rule};
use crate::observability::{log_event, Event};

use super::matcher::{match_tokens, parse_query};
use super::report::{AlmostMatch, ConditionFact, Diagnosis, DiagnosisReport, Explanation};

/// Default number of almost-matching rules reported
pub const DEFAULT_ALMOST_MATCH_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisConfig {
    pub inference: InferenceConfig,
    pub almost_match_limit: usize,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            almost_match_limit: DEFAULT_ALMOST_MATCH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiagnosisRanker {
    config: DiagnosisConfig,
}

impl DiagnosisRanker {
    pub fn new(config: DiagnosisConfig) -> Self {
        Self { config }
    }

    pub fn diagnose(&self, kb: &KnowledgeBase, query: &str) -> EngineResult<DiagnosisReport> {
        let tokens = parse_query(query)?;
        let symptoms = match_tokens(&tokens, &kb.catalog());

        let mut scratch = kb.facts.clone();
        for symptom in &symptoms {
            match &symptom.matched_fact {
                Some(fact) => scratch.assert(fact.as_str(), symptom.cf)?,
                None => log_event(Event::SymptomUnmatched, &[("token", symptom.token.as_str())]),
            }
        }

        let result = ForwardChainer::new(self.config.inference).run_on(&mut scratch, &kb.rules)?;
        let diagnoses = rank_diagnoses(&result, &kb.rules, &scratch);
        let almost_matches = if diagnoses.is_empty() {
            almost_matches(&kb.rules, &scratch, self.config.almost_match_limit)
        } else {
            Vec::new()
        };

        let top = diagnoses.first().map(|d| d.conclusion.as_str()).unwrap_or("");
        log_event(
            Event::DiagnosisCompleted,
            &[
                ("diagnoses", diagnoses.len().to_string().as_str()),
                ("top", top),
                ("almost_matches", almost_matches.len().to_string().as_str()),
            ],
        );

        Ok(DiagnosisReport {
            symptoms,
            diagnoses,
            almost_matches,
            passes: result.passes,
            reached_fixpoint: result.reached_fixpoint,
        })
    }
}

/// Diagnose `query` against a knowledge base without mutating it
pub fn run_diagnosis(
    kb: &KnowledgeBase,
    query: &str,
    config: DiagnosisConfig,
) -> EngineResult<DiagnosisReport> {
    DiagnosisRanker::new(config).diagnose(kb, query)
}

fn rank_diagnoses(result: &InferenceResult, rules: &[Rule], scratch: &FactStore) -> Vec<Diagnosis> {
    let mut diagnoses: Vec<Diagnosis> = result
        .derived
        .iter()
        .filter(|(_, cf)| **cf > 0.0)
        .map(|(conclusion, &cf)| {
            let support: Vec<Explanation> = result
                .firings_for(conclusion)
                .filter_map(|firing| {
                    let rule = rules.get(firing.rule_index)?;
                    Some(Explanation {
                        rule_index: firing.rule_index,
                        rule: rule.to_string(),
                        condition_facts: rule
                            .referenced_facts()
                            .into_iter()
                            .map(|name| ConditionFact {
                                name: name.to_string(),
                                cf: scratch.get(name),
                            })
                            .collect(),
                        condition_value: firing.condition_value,
                        rule_cf: firing.rule_cf,
                        product: firing.output,
                    })
                })
                .collect();
            let rule_index = support.iter().map(|e| e.rule_index).min().unwrap_or(usize::MAX);
            Diagnosis {
                conclusion: conclusion.clone(),
                cf,
                rule_index,
                support,
            }
        })
        .collect();

    diagnoses.sort_by(|a, b| b.cf.total_cmp(&a.cf).then(a.rule_index.cmp(&b.rule_index)));
    diagnoses
}

fn almost_matches(rules: &[Rule], scratch: &FactStore, limit: usize) -> Vec<AlmostMatch> {
    let mut candidates: Vec<AlmostMatch> = rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            let mut relevant: Vec<&str> = Vec::new();
            for (position, condition) in rule.conditions.iter().enumerate() {
                if !condition.is_group() && is_negated(&rule.conditions, position) {
                    continue;
                }
                for name in condition.fact_names() {
                    if !relevant.contains(&name) {
                        relevant.push(name);
                    }
                }
            }

            let total = relevant.len();
            let missing: Vec<String> = relevant
                .iter()
                .filter(|name| !scratch.contains(name))
                .map(|name| name.to_string())
                .collect();
            let matched = total - missing.len();
            if matched == 0 {
                return None;
            }

            Some(AlmostMatch {
                rule_index: index,
                conclusion: rule.conclusion.clone(),
                matched,
                total,
                fraction: matched as f64 / total as f64,
                missing,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.fraction
            .total_cmp(&a.fraction)
            .then(a.rule_index.cmp(&b.rule_index))
    });
    candidates.truncate(limit);
    candidates
}
