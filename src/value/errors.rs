//! Codec error types
//!
//! Error codes:
//! - DOCPIPE_INVALID_ARGUMENT (REJECT)
//! - DOCPIPE_DECODE_FAILED (ERROR)

use std::fmt;

/// Severity levels for codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller input rejected before any network call
    Reject,
    /// Server data could not be reconstituted
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Codec-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorCode {
    /// Unencodable value, over-deep structure or malformed option path
    InvalidArgument,
    /// A wire value has no native counterpart
    DecodeFailed,
}

impl CodecErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CodecErrorCode::InvalidArgument => "DOCPIPE_INVALID_ARGUMENT",
            CodecErrorCode::DecodeFailed => "DOCPIPE_DECODE_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            CodecErrorCode::InvalidArgument => Severity::Reject,
            CodecErrorCode::DecodeFailed => Severity::Error,
        }
    }
}

impl fmt::Display for CodecErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Codec error with the offending argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    code: CodecErrorCode,
    message: String,
    argument: Option<String>,
}

impl CodecError {
    /// Create an invalid argument error for the named argument
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        let argument = argument.into();
        Self {
            code: CodecErrorCode::InvalidArgument,
            message: format!(
                "Value for argument \"{}\" is not valid. {}",
                argument,
                reason.into()
            ),
            argument: Some(argument),
        }
    }

    /// Create a depth-bound error
    pub fn too_deep(argument: impl Into<String>, max_depth: usize) -> Self {
        let argument = argument.into();
        Self {
            code: CodecErrorCode::InvalidArgument,
            message: format!(
                "Value for argument \"{}\" is not a valid document. Input object is deeper than {} levels or contains a cycle.",
                argument, max_depth
            ),
            argument: Some(argument),
        }
    }

    /// Create a malformed field path error
    pub fn invalid_path(path: &str, segment: &str) -> Self {
        Self {
            code: CodecErrorCode::InvalidArgument,
            message: format!(
                "Invalid field path \"{}\": bad segment \"{}\"",
                path, segment
            ),
            argument: Some(path.to_string()),
        }
    }

    /// Create a decode error
    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::DecodeFailed,
            message: reason.into(),
            argument: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> CodecErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the argument name if applicable
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for CodecError {}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
