//! Observability for docpipe
//!
//! - Structured logging (JSON), one line per event
//! - Typed lifecycle events for pipeline execution
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. Logging never fails the operation being logged
//! 3. Deterministic output (sorted fields)
//!
//! # Usage
//!
//! ```ignore
//! use docpipe::observability::{Event, Logger, Severity};
//!
//! let logger = Logger::new(Severity::Info);
//! logger.event(Event::StreamOpen, &[("request_tag", "a1b2c3"), ("attempt", "1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
