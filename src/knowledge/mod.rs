//! Knowledge model: facts, rules and the knowledge base that holds them

mod base;
mod fact;
mod rule;

pub use base::KnowledgeBase;
pub use fact::FactStore;
pub use rule::Rule;
