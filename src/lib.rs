//! cfreason - a certainty-factor rule engine
//!
//! Facts carry a confidence in [0, 1]. Rules combine premise confidences,
//! scale them by their own reliability and forward-chain to a fixpoint.
//! A diagnosis ranker answers "given these symptoms, what is most likely?"
//! on top of the engine.

pub mod api;
pub mod cli;
pub mod condition;
pub mod diagnosis;
pub mod error;
pub mod inference;
pub mod knowledge;
pub mod observability;
pub mod store;
