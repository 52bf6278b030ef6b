//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit status. A rejected
//! one-shot command keeps the engine or store code that caused it, so the
//! stderr line and the stdout envelope agree.

use std::fmt;
use std::io;
use std::path::Path;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// `cfreason.json` missing, unreadable or out of range
    ConfigError,
    /// stdin/stdout or filesystem failure outside the store
    IoError,
    /// `init` found the knowledge base directory already present
    AlreadyInitialized,
    /// The configured knowledge base directory does not exist
    NotInitialized,
    /// The session API rejected the command's request
    CommandFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CFR_CLI_CONFIG_ERROR",
            Self::IoError => "CFR_CLI_IO_ERROR",
            Self::AlreadyInitialized => "CFR_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "CFR_CLI_NOT_INITIALIZED",
            Self::CommandFailed => "CFR_CLI_COMMAND_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    /// Engine, store or API code behind a `CommandFailed`
    cause: Option<String>,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(kb_dir: &Path) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!(
                "Knowledge base directory {} already exists; stored knowledge bases are left untouched",
                kb_dir.display()
            ),
        )
    }

    pub fn not_initialized(kb_dir: &Path) -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            format!(
                "No knowledge base directory at {}. Run 'cfreason init --kb-dir <dir>' first.",
                kb_dir.display()
            ),
        )
    }

    /// A request rejected with `cause` (e.g. `CFR_NOT_FOUND`)
    pub fn command_failed(cause: &str, message: &str) -> Self {
        Self {
            code: CliErrorCode::CommandFailed,
            message: format!("{}: {}", cause, message),
            cause: Some(cause.to_string()),
        }
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Code of the rejected request, for `CommandFailed`
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

pub type CliResult<T> = Result<T, CliError>;
