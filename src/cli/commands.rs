//! CLI command implementations
//!
//! Every command loads and validates the config first. All commands except
//! `init` require an initialized knowledge base directory. One-shot commands
//! run through the same session handler as `session`, so they report the
//! same error codes.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{ApiError, Request, Session};
use crate::diagnosis::{run_diagnosis, DiagnosisConfig, DEFAULT_ALMOST_MATCH_LIMIT};
use crate::inference::{InferenceConfig, DEFAULT_EPSILON, DEFAULT_MAX_PASSES};
use crate::knowledge::KnowledgeBase;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::store::JsonDirectoryStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_lines, write_error, write_line, write_response, write_text};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Knowledge base directory (required)
    pub kb_dir: String,

    /// Pass cap per inference run (optional, default 64)
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// Smallest CF change that counts as progress (optional, default 1e-9)
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Almost-matching rules reported by `diagnose` (optional, default 3)
    #[serde(default = "default_almost_match_limit")]
    pub almost_match_limit: usize,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}
fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}
fn default_almost_match_limit() -> usize {
    DEFAULT_ALMOST_MATCH_LIMIT
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults for everything but the directory
    pub fn new(kb_dir: impl Into<String>) -> Self {
        Self {
            kb_dir: kb_dir.into(),
            max_passes: default_max_passes(),
            epsilon: default_epsilon(),
            almost_match_limit: default_almost_match_limit(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        log_event(
            Event::ConfigLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("kb_dir", config.kb_dir.as_str()),
            ],
        );
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| CliError::config_error(format!("Failed to write config: {}", e)))
    }

    fn validate(&self) -> CliResult<()> {
        if self.kb_dir.trim().is_empty() {
            return Err(CliError::config_error("kb_dir must not be empty"));
        }

        if self.max_passes == 0 {
            return Err(CliError::config_error("max_passes must be > 0"));
        }

        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(CliError::config_error(format!(
                "Invalid epsilon: {}. Must be a finite number >= 0.",
                self.epsilon
            )));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn or error.",
                self.log_level
            )));
        }

        Ok(())
    }

    pub fn kb_path(&self) -> &Path {
        Path::new(&self.kb_dir)
    }

    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    pub fn diagnosis_config(&self) -> DiagnosisConfig {
        DiagnosisConfig {
            inference: InferenceConfig {
                max_passes: self.max_passes,
                epsilon: self.epsilon,
            },
            almost_match_limit: self.almost_match_limit,
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, kb_dir } => init(&config, &kb_dir),
        Command::List { config } => list(&config),
        Command::Show { config, kb } => show(&config, &kb),
        Command::Infer { config, kb, save } => infer(&config, &kb, save),
        Command::Diagnose {
            config,
            kb,
            query,
            text,
        } => diagnose(&config, &kb, &query, text),
        Command::Delete { config, kb } => delete(&config, &kb),
        Command::Session { config, kb } => session(&config, kb.as_deref()),
    }
}

/// Create the knowledge base directory.
///
/// An existing config file is reused; otherwise a default one pointing at
/// `kb_dir` is written. Refuses to run twice.
pub fn init(config_path: &Path, kb_dir: &Path) -> CliResult<()> {
    let existing = config_path.exists();
    let config = if existing {
        Config::load(config_path)?
    } else {
        Config::new(kb_dir.to_string_lossy())
    };

    if is_initialized(config.kb_path()) {
        return Err(CliError::already_initialized(config.kb_path()));
    }

    if !existing {
        config.save(config_path)?;
    }

    fs::create_dir_all(config.kb_path()).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", config.kb_path(), e))
    })?;

    write_response(json!({"initialized": true, "kb_dir": config.kb_dir}))
}

/// List stored knowledge bases
pub fn list(config_path: &Path) -> CliResult<()> {
    let (_, mut session) = open_session(config_path)?;
    let data = execute(&mut session, Request::List)?;
    write_response(data)
}

/// Print a stored knowledge base
pub fn show(config_path: &Path, kb: &str) -> CliResult<()> {
    let (_, mut session) = open_session(config_path)?;
    execute(&mut session, Request::Load { id: kb.to_string() })?;
    let data = execute(&mut session, Request::State)?;
    write_response(data)
}

/// Run inference on a stored knowledge base, optionally saving the result
pub fn infer(config_path: &Path, kb: &str, save: bool) -> CliResult<()> {
    let (_, mut session) = open_session(config_path)?;
    execute(&mut session, Request::Load { id: kb.to_string() })?;
    let mut data = execute(&mut session, Request::Infer)?;

    if save {
        let saved = execute(&mut session, Request::Save { id: None })?;
        data["saved"] = saved["saved"].clone();
    }
    write_response(data)
}

/// Diagnose symptoms against a stored knowledge base
pub fn diagnose(config_path: &Path, kb: &str, query: &str, text: bool) -> CliResult<()> {
    let (config, mut session) = open_session(config_path)?;
    execute(&mut session, Request::Load { id: kb.to_string() })?;

    if !text {
        let data = execute(
            &mut session,
            Request::Diagnose {
                query: query.to_string(),
            },
        )?;
        return write_response(data);
    }

    let report = run_diagnosis(session.knowledge_base(), query, config.diagnosis_config())
        .map_err(|e| rejected(&ApiError::from(e)))?;
    write_text(&report.to_string())
}

/// Remove a stored knowledge base
pub fn delete(config_path: &Path, kb: &str) -> CliResult<()> {
    let (_, mut session) = open_session(config_path)?;
    let data = execute(&mut session, Request::Delete { id: kb.to_string() })?;
    write_response(data)
}

/// Interactive session over stdin/stdout
pub fn session(config_path: &Path, kb: Option<&str>) -> CliResult<()> {
    let (_, mut session) = open_session(config_path)?;
    if let Some(id) = kb {
        execute(&mut session, Request::Load { id: id.to_string() })?;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = serve_session(&mut session, stdin.lock(), &mut out);

    session.finish();
    result.map(|_| ())
}

/// Answer each request line with one response line.
///
/// Rejected requests are answered with an error response and the loop goes
/// on; only I/O failures end it. Returns the number of requests handled.
pub fn serve_session<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    output: &mut W,
) -> CliResult<usize> {
    let mut handled = 0;
    for line in read_lines(input) {
        let line = line?;
        let response = session.handle(&line);
        write_line(output, &response.to_json())?;
        handled += 1;
    }
    Ok(handled)
}

/// Load config, apply its log level and open a session on the store
fn open_session(config_path: &Path) -> CliResult<(Config, Session)> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity());

    if !is_initialized(config.kb_path()) {
        return Err(CliError::not_initialized(config.kb_path()));
    }

    let store = JsonDirectoryStore::open(config.kb_path())
        .map_err(|e| CliError::io_error(e.to_string()))?;

    let session =
        Session::new(KnowledgeBase::new(), config.diagnosis_config()).with_store(Box::new(store));
    Ok((config, session))
}

/// Dispatch one request; a rejection is reported on stdout and fails the
/// command
fn execute(session: &mut Session, request: Request) -> CliResult<Value> {
    session.dispatch(request).map_err(|e| rejected(&e))
}

fn rejected(err: &ApiError) -> CliError {
    if let Err(io_err) = write_error(err.code(), err.message()) {
        return io_err;
    }
    CliError::command_failed(err.code(), err.message())
}

/// Check if the knowledge base directory exists
fn is_initialized(kb_dir: &Path) -> bool {
    kb_dir.is_dir()
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::store::KnowledgeBaseStore;
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> PathBuf {
        let config_path = temp_dir.path().join("cfreason.json");
        let kb_dir = temp_dir.path().join("kb");

        let config = json!({
            "kb_dir": kb_dir.to_string_lossy()
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn flu_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        kb.assert_fact("fever", 0.9).unwrap();
        kb.assert_fact("cough", 0.7).unwrap();
        kb.define_rule(&["fever AND", "cough"], "flu", 0.8).unwrap();
        kb
    }

    #[test]
    fn test_init_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path, Path::new("unused")).unwrap();

        assert!(temp_dir.path().join("kb").is_dir());
    }

    #[test]
    fn test_init_writes_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cfreason.json");
        let kb_dir = temp_dir.path().join("bases");

        init(&config_path, &kb_dir).unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config, Config::new(kb_dir.to_string_lossy()));
        assert!(kb_dir.is_dir());
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        init(&config_path, Path::new("unused")).unwrap();

        let result = init(&config_path, Path::new("unused"));
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().code(),
            &CliErrorCode::AlreadyInitialized
        );
    }

    #[test]
    fn test_list_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let result = list(&config_path);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_config_validates_log_level() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cfreason.json");

        let config = json!({
            "kb_dir": "kb",
            "log_level": "loud"
        });
        fs::write(&config_path, config.to_string()).unwrap();

        let result = Config::load(&config_path);
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_config_validates_passes_and_epsilon() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cfreason.json");

        fs::write(&config_path, json!({"kb_dir": "kb", "max_passes": 0}).to_string()).unwrap();
        assert!(Config::load(&config_path).is_err());

        fs::write(&config_path, json!({"kb_dir": "kb", "epsilon": -0.5}).to_string()).unwrap();
        assert!(Config::load(&config_path).is_err());
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.max_passes, 64);
        assert_eq!(config.epsilon, 1e-9);
        assert_eq!(config.almost_match_limit, 3);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.diagnosis_config(), DiagnosisConfig::default());
    }

    #[test]
    fn test_infer_with_save() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        init(&config_path, Path::new("unused")).unwrap();

        let store = JsonDirectoryStore::open(temp_dir.path().join("kb")).unwrap();
        store.save("clinic", &flu_kb()).unwrap();

        infer(&config_path, "clinic", true).unwrap();

        let saved = store.load("clinic").unwrap();
        let flu = saved.facts.get("flu").unwrap();
        assert!((flu - 0.56).abs() < 1e-9);
    }

    #[test]
    fn test_show_missing_kb_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        init(&config_path, Path::new("unused")).unwrap();

        let err = show(&config_path, "nope").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::CommandFailed);
        assert_eq!(err.cause(), Some("CFR_NOT_FOUND"));
    }

    #[test]
    fn test_serve_session_answers_every_line() {
        let mut session = Session::new(KnowledgeBase::new(), DiagnosisConfig::default());
        let input = Cursor::new(
            [
                r#"{"op": "assert_fact", "name": "fever", "cf": 0.9}"#,
                "",
                "not json",
                r#"{"op": "state"}"#,
            ]
            .join("\n"),
        );
        let mut output = Vec::new();

        let handled = serve_session(&mut session, input, &mut output).unwrap();
        assert_eq!(handled, 3);

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[1]["code"], "CFR_INVALID_REQUEST");
        assert_eq!(lines[2]["data"]["facts"]["fever"], 0.9);
    }
}
