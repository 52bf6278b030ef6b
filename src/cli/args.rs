//! CLI argument definitions using clap
//!
//! Commands:
//! - cfreason init --config <path> --kb-dir <dir>
//! - cfreason list --config <path>
//! - cfreason show --kb <id>
//! - cfreason infer --kb <id> [--save]
//! - cfreason diagnose --kb <id> --query <symptoms> [--text]
//! - cfreason delete --kb <id>
//! - cfreason session [--kb <id>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cfreason - a certainty-factor rule engine
#[derive(Parser, Debug)]
#[command(name = "cfreason")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config and create the knowledge base directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,

        /// Knowledge base directory recorded in a new config
        #[arg(long, default_value = "./knowledge_base")]
        kb_dir: PathBuf,
    },

    /// List stored knowledge bases
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,
    },

    /// Print a stored knowledge base
    Show {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,

        /// Knowledge base id
        #[arg(long)]
        kb: String,
    },

    /// Run forward chaining to a fixpoint
    Infer {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,

        /// Knowledge base id
        #[arg(long)]
        kb: String,

        /// Write the derived facts back to the store
        #[arg(long)]
        save: bool,
    },

    /// Rank diagnoses for a comma-separated list of symptoms
    Diagnose {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,

        /// Knowledge base id
        #[arg(long)]
        kb: String,

        /// Symptoms, e.g. "fever, cough: 0.7"
        #[arg(long)]
        query: String,

        /// Human-readable report instead of JSON
        #[arg(long)]
        text: bool,
    },

    /// Remove a stored knowledge base
    Delete {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,

        /// Knowledge base id
        #[arg(long)]
        kb: String,
    },

    /// Serve JSON requests from stdin, one per line
    Session {
        /// Path to configuration file
        #[arg(long, default_value = "./cfreason.json")]
        config: PathBuf,

        /// Knowledge base to start from; empty when omitted
        #[arg(long)]
        kb: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
