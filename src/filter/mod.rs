//! Legacy filter support
//!
//! Field filters and AND/OR composites, compiled into the same boolean
//! expression trees the pipeline API uses.

mod ast;
mod compiler;

pub use ast::{CompositeFilter, CompositeOperator, FieldFilter, FieldOperator, Filter};
pub use compiler::compile_filter;
