//! Streaming execution for docpipe
//!
//! Issues a structured pipeline as a server-streaming call, decodes frames
//! into typed elements, and transparently re-opens the stream when the
//! transport ends it without a terminal signal.
//!
//! # Design Principles
//!
//! - One logical stream per call; never two network streams at once
//! - No retries on transport errors; classification only
//! - Input errors surface before any network call
//! - Dropping the outward stream tears down the inbound one

mod config;
mod engine;
mod errors;
mod frame;
mod request;
mod result;
mod retry;
mod transport;

pub use config::EngineConfig;
pub use engine::{ElementStream, ExecutionEngine};
pub use errors::{ExecutionError, ExecutionResult, RpcCode, TransportError};
pub use frame::{decode_frame, ResponseFrame, StreamElement, StreamMessage, WireDocument};
pub use request::{Consistency, ExecuteOptions, ExecuteRequest};
pub use result::{PipelineResponse, PipelineResult};
pub use retry::{MethodRetrySettings, RetryPolicy};
pub use transport::{AlwaysReady, FrameStream, Readiness, Transport};
