//! # Knowledge Base Storage
//!
//! Named knowledge bases persisted as JSON documents:
//!
//! ```json
//! {
//!   "facts": {"fever": 0.9},
//!   "rules": [{"if": [...], "then": "flu", "cf": 0.8}]
//! }
//! ```
//!
//! Loading validates the document; a file that parses but holds an
//! out-of-range CF or an empty premise is reported as corrupt.

mod backend;
mod errors;
mod json_dir;

pub use backend::KnowledgeBaseStore;
pub use errors::{StoreError, StoreResult};
pub use json_dir::{normalize_id, JsonDirectoryStore};
