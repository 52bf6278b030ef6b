//! Session API
//!
//! JSON request/response surface over one knowledge base. Requests are
//! handled serially; each one either applies fully or is rejected with a
//! pass-through error code.
//!
//! # Supported Operations
//!
//! - assert_fact, edit_fact, retract_fact
//! - define_rule, edit_rule, retract_rule
//! - infer, diagnose, state
//! - load, save, list, delete

mod errors;
mod handler;
mod request;
mod response;

pub use errors::{ApiError, ApiErrorCode, ApiResult};
pub use handler::Session;
pub use request::{Request, RuleSpec};
pub use response::{ErrorResponse, Response, SuccessResponse};
