//! Forward-chaining inference with certainty factors

mod certainty;
mod engine;

pub use certainty::{combine, combine_all, rule_output};
pub use engine::{
    run_inference, EngineState, Firing, ForwardChainer, InferenceConfig, InferenceResult,
    DEFAULT_EPSILON, DEFAULT_MAX_PASSES,
};
