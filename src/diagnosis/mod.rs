//! Symptom-driven diagnosis
//!
//! Answers "given these symptoms, what is most likely?" by running the
//! forward-chaining engine over a scratch copy of the knowledge base and
//! ranking what it derives. When nothing fires, the report lists the rules
//! that came closest.

mod matcher;
mod ranker;
mod report;

pub use matcher::{match_symptom, match_tokens, parse_query, SymptomMatch, SymptomToken, DEFAULT_SYMPTOM_CF};
pub use ranker::{run_diagnosis, DiagnosisConfig, DiagnosisRanker, DEFAULT_ALMOST_MATCH_LIMIT};
pub use report::{AlmostMatch, ConditionFact, Diagnosis, DiagnosisReport, Explanation};
