//! CLI module for cfreason
//!
//! Provides command-line interface for:
//! - init: Write config and create the knowledge base directory
//! - list / show / delete: Inspect and manage stored knowledge bases
//! - infer: One-shot forward chaining
//! - diagnose: One-shot symptom ranking
//! - session: JSON-lines request loop over stdin/stdout

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    delete, diagnose, infer, init, list, run, run_command, serve_session, session, show, Config,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_lines, write_error, write_response};
