//! Observable lifecycle events
//!
//! Events are explicit and typed; each maps to one stable uppercase name.

use std::fmt;

use super::Severity;

/// Observable events in cfreason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,

    // Inference
    /// Forward-chaining run begins
    InferenceStarted,
    /// A rule fired and changed its conclusion
    RuleFired,
    /// A full pass over the rule set finished
    PassCompleted,
    /// No pass changed anything; run is stable
    FixpointReached,
    /// Run stopped by the pass cap before becoming stable
    PassCapReached,

    // Diagnosis
    /// A symptom token had no match in the catalog
    SymptomUnmatched,
    /// Ranked diagnosis produced
    DiagnosisCompleted,

    // Knowledge base storage
    /// Knowledge base read from the store
    KnowledgeBaseLoaded,
    /// Knowledge base written to the store
    KnowledgeBaseSaved,
    /// Knowledge base removed from the store
    KnowledgeBaseDeleted,

    // Session
    /// JSON-lines session accepting requests
    SessionStarted,
    /// A session request was rejected
    RequestRejected,
    /// Session input closed
    SessionEnded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::InferenceStarted => "INFERENCE_BEGIN",
            Event::RuleFired => "RULE_FIRED",
            Event::PassCompleted => "PASS_COMPLETE",
            Event::FixpointReached => "FIXPOINT_REACHED",
            Event::PassCapReached => "PASS_CAP_REACHED",

            Event::SymptomUnmatched => "SYMPTOM_UNMATCHED",
            Event::DiagnosisCompleted => "DIAGNOSIS_COMPLETE",

            Event::KnowledgeBaseLoaded => "KB_LOADED",
            Event::KnowledgeBaseSaved => "KB_SAVED",
            Event::KnowledgeBaseDeleted => "KB_DELETED",

            Event::SessionStarted => "SESSION_BEGIN",
            Event::RequestRejected => "REQUEST_REJECTED",
            Event::SessionEnded => "SESSION_END",
        }
    }

    /// Severity used when the event is logged without an override
    pub fn severity(&self) -> Severity {
        match self {
            Event::RuleFired | Event::PassCompleted => Severity::Trace,
            Event::PassCapReached | Event::SymptomUnmatched | Event::RequestRejected => {
                Severity::Warn
            }
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
