//! # JSON Directory Store
//!
//! One pretty-printed JSON file per knowledge base, all in a single flat
//! directory. Ids are file names; `.json` is appended when missing.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::knowledge::KnowledgeBase;
use crate::observability::{log_event, Event};

use super::backend::KnowledgeBaseStore;
use super::errors::{StoreError, StoreResult};

const EXTENSION: &str = ".json";

fn plain_file_name() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^/\\\x00]+$").unwrap_or_else(|e| unreachable!("static pattern is valid: {}", e))
    })
}

/// Validate an id and append `.json` if missing
pub fn normalize_id(id: &str) -> StoreResult<String> {
    let id = id.trim();
    if !plain_file_name().is_match(id) || id.contains("..") || id == EXTENSION {
        return Err(StoreError::InvalidName(id.to_string()));
    }
    if id.ends_with(EXTENSION) {
        Ok(id.to_string())
    } else {
        Ok(format!("{}{}", id, EXTENSION))
    }
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct JsonDirectoryStore {
    root: PathBuf,
}

impl JsonDirectoryStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> StoreResult<(String, PathBuf)> {
        let id = normalize_id(id)?;
        let path = self.root.join(&id);
        Ok((id, path))
    }
}

fn not_found_or_io(id: &str, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::NotFound(id.to_string())
    } else {
        StoreError::Io(err.to_string())
    }
}

impl KnowledgeBaseStore for JsonDirectoryStore {
    fn list(&self) -> StoreResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(EXTENSION) {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn load(&self, id: &str) -> StoreResult<KnowledgeBase> {
        let (id, path) = self.path_for(id)?;
        let bytes = fs::read(&path).map_err(|e| not_found_or_io(&id, e))?;

        let kb: KnowledgeBase = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(id.clone(), e.to_string()))?;
        kb.validate()
            .map_err(|e| StoreError::Corrupt(id.clone(), e.to_string()))?;

        log_event(
            Event::KnowledgeBaseLoaded,
            &[
                ("id", id.as_str()),
                ("facts", kb.facts.len().to_string().as_str()),
                ("rules", kb.rules.len().to_string().as_str()),
            ],
        );
        Ok(kb)
    }

    fn save(&self, id: &str, kb: &KnowledgeBase) -> StoreResult<String> {
        let (id, path) = self.path_for(id)?;
        let json = serde_json::to_string_pretty(kb)
            .map_err(|e| StoreError::Io(e.to_string()))?;

        // staged write, then rename over the target
        let staging = self.root.join(format!(".{}.tmp", id));
        fs::write(&staging, json)?;
        fs::rename(&staging, &path)?;

        log_event(Event::KnowledgeBaseSaved, &[("id", id.as_str())]);
        Ok(id)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let (id, path) = self.path_for(id)?;
        fs::remove_file(&path).map_err(|e| not_found_or_io(&id, e))?;
        log_event(Event::KnowledgeBaseDeleted, &[("id", id.as_str())]);
        Ok(())
    }
}
