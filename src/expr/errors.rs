//! # Compile Errors
//!
//! Errors raised while translating filters, cursors and queries into
//! expression trees. All of them are raised before any network call.

use thiserror::Error;

use crate::value::CodecError;

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Compile errors
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    // ==================
    // Cursor Errors
    // ==================
    /// Cursoring needs at least one ordering
    #[error("Cursor requires at least one ordering")]
    EmptyOrderings,

    /// Cursor carries no values
    #[error("Cursor must contain at least one value")]
    EmptyCursor,

    /// Cursor has more values than there are orderings
    #[error("Too many cursor values: {values} values for {orderings} orderings")]
    CursorTooLong { values: usize, orderings: usize },

    // ==================
    // Filter Errors
    // ==================
    /// Operator has no pipeline counterpart. Indicates a programming error.
    #[error("Unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    /// Composite filter without children
    #[error("Composite filter must contain at least one filter")]
    EmptyComposite,

    /// Filter value has the wrong shape for its operator
    #[error("Invalid value for '{operator}' filter on field '{field}': {reason}")]
    InvalidFilterValue {
        field: String,
        operator: String,
        reason: String,
    },

    // ==================
    // Query Errors
    // ==================
    /// Query shape is not translatable
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Value encoding failed
    #[error("{0}")]
    Codec(#[from] CodecError),
}
