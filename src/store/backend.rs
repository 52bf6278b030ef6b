//! # Knowledge Base Store Trait

use crate::knowledge::KnowledgeBase;

use super::errors::StoreResult;

/// Persistent home for named knowledge bases
pub trait KnowledgeBaseStore: std::fmt::Debug {
    /// Stored ids, sorted
    fn list(&self) -> StoreResult<Vec<String>>;

    /// Load and validate a knowledge base
    fn load(&self, id: &str) -> StoreResult<KnowledgeBase>;

    /// Write a knowledge base, returning the id it was stored under
    fn save(&self, id: &str, kb: &KnowledgeBase) -> StoreResult<String>;

    fn delete(&self, id: &str) -> StoreResult<()>;
}
