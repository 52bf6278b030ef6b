//! Session API error types
//!
//! API errors are pass-through: they keep the code of the engine or store
//! error that caused them. The API adds only request-level codes.

use std::fmt;

use crate::error::EngineError;
use crate::store::StoreError;

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Malformed JSON or a missing field
    InvalidRequest,
    /// `op` names no known operation
    UnknownOperation,
    /// Storage operation on a session opened without a store
    NoStore,
}

impl ApiErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "CFR_INVALID_REQUEST",
            ApiErrorCode::UnknownOperation => "CFR_UNKNOWN_OPERATION",
            ApiErrorCode::NoStore => "CFR_NO_STORE",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with the originating error code preserved
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    code: String,
    message: String,
    rule_index: Option<usize>,
}

impl ApiError {
    fn with_code(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code().to_string(),
            message: message.into(),
            rule_index: None,
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::with_code(ApiErrorCode::InvalidRequest, reason)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::invalid_request(format!("Missing {}", field))
    }

    pub fn unknown_operation(op: impl Into<String>) -> Self {
        Self::with_code(
            ApiErrorCode::UnknownOperation,
            format!("Unknown operation: {}", op.into()),
        )
    }

    pub fn no_store() -> Self {
        Self::with_code(
            ApiErrorCode::NoStore,
            "Session has no knowledge base directory",
        )
    }

    /// Pass-through from the engine
    pub fn from_engine_error(err: EngineError) -> Self {
        Self {
            code: err.code().code().to_string(),
            message: err.message().to_string(),
            rule_index: err.rule_index(),
        }
    }

    /// Pass-through from the store
    pub fn from_store_error(err: StoreError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            rule_index: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rule_index(&self) -> Option<usize> {
        self.rule_index
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self::from_engine_error(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from_store_error(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
