//! # Store Errors

use thiserror::Error;

/// Result type for knowledge base storage
pub type StoreResult<T> = Result<T, StoreError>;

/// Knowledge base storage errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Knowledge base not found: {0}")]
    NotFound(String),

    #[error("Invalid knowledge base name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt knowledge base {0}: {1}")]
    Corrupt(String, String),
}

impl StoreError {
    /// Stable error code, shared with the session API
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "CFR_NOT_FOUND",
            StoreError::InvalidName(_) => "CFR_INVALID_NAME",
            StoreError::Io(_) => "CFR_STORE_IO",
            StoreError::Corrupt(_, _) => "CFR_CORRUPT_KNOWLEDGE_BASE",
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
