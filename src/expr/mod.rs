//! Expression model for docpipe
//!
//! Typed expression trees (fields, constants, functions, boolean
//! functions), orderings, and the cursor-to-condition translator.
//!
//! # Design Principles
//!
//! - Immutable: expressions are built bottom-up and never mutated
//! - Syntactic: translation is deterministic, no evaluation on the client
//! - Boolean functions always serialize as wire function calls

mod cursor;
mod errors;
mod expression;
mod ordering;

pub use cursor::{cursor_condition, Cursor, CursorPosition};
pub use errors::{CompileError, CompileResult};
pub use expression::{
    and, functions, or, BooleanExpr, Expression, FunctionExpr, DOCUMENT_ID_FIELD,
};
pub use ordering::{reverse_orderings, Direction, Ordering};
