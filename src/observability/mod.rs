//! Observability for cfreason
//!
//! Structured JSON logging of lifecycle events. Logging is read-only: it has
//! no effect on inference results and never fails an operation.
//!
//! # Usage
//!
//! ```ignore
//! use cfreason::observability::{log_event, Event};
//!
//! log_event(Event::FixpointReached, &[("passes", "3")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
