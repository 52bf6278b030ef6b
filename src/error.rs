//! Engine error types
//!
//! Error codes:
//! - CFR_INVALID_CONFIDENCE (REJECT)
//! - CFR_EMPTY_CONDITION (REJECT)
//! - CFR_MALFORMED_EXPRESSION (REJECT)
//! - CFR_INVALID_GROUP_OPERATOR (REJECT)
//! - CFR_NOT_FOUND (REJECT)
//! - CFR_INDEX_OUT_OF_RANGE (REJECT)
//! - CFR_EMPTY_QUERY (REJECT)
//!
//! Every engine error is local and recoverable. A failed mutation leaves the
//! knowledge base untouched.

use std::fmt;

/// Engine error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorCode {
    /// Confidence outside [0, 1] or not a finite number
    InvalidConfidence,
    /// Empty fact name, empty group or empty condition list
    EmptyCondition,
    /// Unbalanced parentheses or a dangling operator word
    MalformedExpression,
    /// NOT applied to a group with more than one member
    InvalidGroupOperator,
    /// Reference to a fact that does not exist
    NotFound,
    /// Reference to a rule index that does not exist
    IndexOutOfRange,
    /// Diagnosis query without any symptom tokens
    EmptyQuery,
}

impl EngineErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            EngineErrorCode::InvalidConfidence => "CFR_INVALID_CONFIDENCE",
            EngineErrorCode::EmptyCondition => "CFR_EMPTY_CONDITION",
            EngineErrorCode::MalformedExpression => "CFR_MALFORMED_EXPRESSION",
            EngineErrorCode::InvalidGroupOperator => "CFR_INVALID_GROUP_OPERATOR",
            EngineErrorCode::NotFound => "CFR_NOT_FOUND",
            EngineErrorCode::IndexOutOfRange => "CFR_INDEX_OUT_OF_RANGE",
            EngineErrorCode::EmptyQuery => "CFR_EMPTY_QUERY",
        }
    }
}

impl fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with structured detail for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct EngineError {
    code: EngineErrorCode,
    message: String,
    /// Offending fact name or token
    subject: Option<String>,
    /// Offending rule index
    rule_index: Option<usize>,
}

impl EngineError {
    fn new(code: EngineErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            subject: None,
            rule_index: None,
        }
    }

    /// Confidence outside [0, 1]
    pub fn invalid_confidence(value: f64) -> Self {
        let mut err = Self::new(
            EngineErrorCode::InvalidConfidence,
            format!("Confidence must be within [0, 1], got {}", value),
        );
        err.subject = Some(value.to_string());
        err
    }

    /// Fact asserted without a name
    pub fn empty_fact_name() -> Self {
        Self::new(
            EngineErrorCode::InvalidConfidence,
            "Fact name must not be empty",
        )
    }

    /// Confidence text that is not a number
    pub fn unparsable_confidence(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut err = Self::new(
            EngineErrorCode::InvalidConfidence,
            format!("Confidence '{}' is not a number", text),
        );
        err.subject = Some(text);
        err
    }

    /// Empty fact name or empty condition list
    pub fn empty_condition(context: impl Into<String>) -> Self {
        Self::new(EngineErrorCode::EmptyCondition, context)
    }

    /// Syntax fault in a condition expression
    pub fn malformed(token: impl Into<String>, reason: &str) -> Self {
        let token = token.into();
        let mut err = Self::new(
            EngineErrorCode::MalformedExpression,
            format!("Malformed expression '{}': {}", token, reason),
        );
        err.subject = Some(token);
        err
    }

    /// NOT used on a multi-member group
    pub fn invalid_group_operator(members: usize) -> Self {
        Self::new(
            EngineErrorCode::InvalidGroupOperator,
            format!("NOT requires a single-member group, got {} members", members),
        )
    }

    /// Missing fact
    pub fn fact_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut err = Self::new(
            EngineErrorCode::NotFound,
            format!("Fact '{}' not found", name),
        );
        err.subject = Some(name);
        err
    }

    /// Rule index past the end of the rule set
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        let mut err = Self::new(
            EngineErrorCode::IndexOutOfRange,
            format!("Rule index {} out of range (rule count {})", index, len),
        );
        err.rule_index = Some(index);
        err
    }

    /// Diagnosis query with no symptoms
    pub fn empty_query() -> Self {
        Self::new(
            EngineErrorCode::EmptyQuery,
            "Query must list at least one symptom, separated by commas",
        )
    }

    /// Attach the index of the rule being processed
    pub fn in_rule(mut self, index: usize) -> Self {
        self.rule_index = Some(index);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> EngineErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending fact name or token, if any
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the offending rule index, if any
    pub fn rule_index(&self) -> Option<usize> {
        self.rule_index
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code, self.message)?;
        if let Some(index) = self.rule_index {
            write!(f, " [rule {}]", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Check that a confidence value lies within [0, 1]
pub fn check_confidence(cf: f64) -> EngineResult<f64> {
    if cf.is_finite() && (0.0..=1.0).contains(&cf) {
        Ok(cf)
    } else {
        Err(EngineError::invalid_confidence(cf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineErrorCode::InvalidConfidence.code(),
            "CFR_INVALID_CONFIDENCE"
        );
        assert_eq!(
            EngineErrorCode::MalformedExpression.code(),
            "CFR_MALFORMED_EXPRESSION"
        );
        assert_eq!(
            EngineErrorCode::IndexOutOfRange.code(),
            "CFR_INDEX_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_check_confidence_bounds() {
        assert!(check_confidence(0.0).is_ok());
        assert!(check_confidence(1.0).is_ok());
        assert!(check_confidence(-0.01).is_err());
        assert!(check_confidence(1.01).is_err());
        assert!(check_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_error_display_carries_rule_index() {
        let err = EngineError::invalid_group_operator(2).in_rule(4);
        let display = err.to_string();
        assert!(display.contains("CFR_INVALID_GROUP_OPERATOR"));
        assert!(display.contains("[rule 4]"));
        assert_eq!(err.rule_index(), Some(4));
    }

    #[test]
    fn test_malformed_keeps_token() {
        let err = EngineError::malformed("(A, B", "unterminated group");
        assert_eq!(err.subject(), Some("(A, B"));
        assert_eq!(err.code(), EngineErrorCode::MalformedExpression);
    }
}
