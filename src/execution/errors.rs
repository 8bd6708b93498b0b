//! # Execution Errors
//!
//! Errors surfaced by the streaming execution engine.

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::CompileError;
use crate::value::CodecError;

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Status codes reported by the RPC transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl RpcCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcCode::Cancelled => "CANCELLED",
            RpcCode::Unknown => "UNKNOWN",
            RpcCode::InvalidArgument => "INVALID_ARGUMENT",
            RpcCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RpcCode::NotFound => "NOT_FOUND",
            RpcCode::AlreadyExists => "ALREADY_EXISTS",
            RpcCode::PermissionDenied => "PERMISSION_DENIED",
            RpcCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            RpcCode::FailedPrecondition => "FAILED_PRECONDITION",
            RpcCode::Aborted => "ABORTED",
            RpcCode::OutOfRange => "OUT_OF_RANGE",
            RpcCode::Unimplemented => "UNIMPLEMENTED",
            RpcCode::Internal => "INTERNAL",
            RpcCode::Unavailable => "UNAVAILABLE",
            RpcCode::DataLoss => "DATA_LOSS",
            RpcCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error reported by the transport for one streaming call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    pub code: RpcCode,
    pub message: String,
}

impl TransportError {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Execution errors
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    // ==================
    // Input Errors
    // ==================
    /// Request could not be encoded
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// Query could not be translated into a pipeline
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Engine configuration rejected
    #[error("Invalid engine configuration: {0}")]
    Config(String),

    // ==================
    // Precondition Errors
    // ==================
    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientNotReady(String),

    /// Response decoder metadata could not be loaded
    #[error("Response decoder unavailable: {0}")]
    DecoderNotReady(String),

    // ==================
    // Stream Errors
    // ==================
    /// Transport failure, with the public call that started the execution
    #[error("{error} (permanent: {permanent}, called at {call_site})")]
    Transport {
        error: TransportError,
        permanent: bool,
        call_site: &'static Location<'static>,
    },

    /// A response frame could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(CodecError),
}

impl ExecutionError {
    /// Returns the transport status code, if this is a transport error
    pub fn rpc_code(&self) -> Option<RpcCode> {
        match self {
            ExecutionError::Transport { error, .. } => Some(error.code),
            _ => None,
        }
    }

    /// Returns true for transport errors classified as permanent
    pub fn is_permanent(&self) -> bool {
        matches!(self, ExecutionError::Transport { permanent: true, .. })
    }

    /// Call site of the public call, for transport errors
    pub fn call_site(&self) -> Option<&'static Location<'static>> {
        match self {
            ExecutionError::Transport { call_site, .. } => Some(*call_site),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new(RpcCode::PermissionDenied, "missing rights");
        assert_eq!(err.to_string(), "PERMISSION_DENIED: missing rights");
    }

    #[test]
    fn test_transport_variant_carries_call_site() {
        let call_site = Location::caller();
        let err = ExecutionError::Transport {
            error: TransportError::new(RpcCode::Internal, "boom"),
            permanent: true,
            call_site,
        };
        assert!(err.is_permanent());
        assert_eq!(err.rpc_code(), Some(RpcCode::Internal));
        assert_eq!(err.call_site().map(|l| l.file()), Some(file!()));
        assert!(err.to_string().contains(file!()));
    }

    #[test]
    fn test_rpc_code_serde() {
        let code: RpcCode = serde_json::from_str("\"RESOURCE_EXHAUSTED\"").unwrap();
        assert_eq!(code, RpcCode::ResourceExhausted);
    }

    #[test]
    fn test_input_errors_convert() {
        let err: ExecutionError = CodecError::invalid_argument("value", "bad").into();
        assert!(err.rpc_code().is_none());
        assert!(err.call_site().is_none());
    }
}
