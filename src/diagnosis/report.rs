//! Diagnosis report types

use std::fmt;

use serde::Serialize;

use super::matcher::SymptomMatch;

/// A premise fact as seen by the scratch store after the run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionFact {
    pub name: String,
    /// `None` when the fact was absent
    pub cf: Option<f64>,
}

/// One rule firing behind a diagnosis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub rule_index: usize,
    /// Rule rendered as `IF ... THEN ... (CF ...)`
    pub rule: String,
    pub condition_facts: Vec<ConditionFact>,
    pub condition_value: f64,
    pub rule_cf: f64,
    pub product: f64,
}

/// A ranked conclusion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub conclusion: String,
    pub cf: f64,
    /// Index of the first rule that concluded it
    pub rule_index: usize,
    pub support: Vec<Explanation>,
}

/// A rule whose premise was only partly present
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlmostMatch {
    pub rule_index: usize,
    pub conclusion: String,
    pub matched: usize,
    pub total: usize,
    pub fraction: f64,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub symptoms: Vec<SymptomMatch>,
    /// Sorted by CF descending
    pub diagnoses: Vec<Diagnosis>,
    /// Only filled when `diagnoses` is empty
    pub almost_matches: Vec<AlmostMatch>,
    pub passes: usize,
    pub reached_fixpoint: bool,
}

impl DiagnosisReport {
    pub fn unmatched(&self) -> impl Iterator<Item = &SymptomMatch> {
        self.symptoms.iter().filter(|s| !s.is_matched())
    }

    pub fn top(&self) -> Option<&Diagnosis> {
        self.diagnoses.first()
    }
}

impl fmt::Display for DiagnosisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symptom in self.unmatched() {
            writeln!(f, "unknown symptom: {}", symptom.token)?;
        }
        for (rank, diagnosis) in self.diagnoses.iter().enumerate() {
            writeln!(f, "{}. {} ({:.1}%)", rank + 1, diagnosis.conclusion, diagnosis.cf * 100.0)?;
            for explanation in &diagnosis.support {
                writeln!(
                    f,
                    "   rule {}: {} -> {:.3} * {:.3} = {:.3}",
                    explanation.rule_index,
                    explanation.rule,
                    explanation.condition_value,
                    explanation.rule_cf,
                    explanation.product
                )?;
            }
        }
        for almost in &self.almost_matches {
            writeln!(
                f,
                "almost: {} ({}/{}), missing {}",
                almost.conclusion,
                almost.matched,
                almost.total,
                almost.missing.join(", ")
            )?;
        }
        Ok(())
    }
}
