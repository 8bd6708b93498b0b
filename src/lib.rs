//! docpipe - client-side pipeline compiler, wire codec and streaming
//! executor for document database pipelines
//!
//! - `value`: native <-> wire value codec
//! - `expr`: expression trees, orderings, cursor conditions
//! - `filter`: legacy filter trees and their compiler
//! - `pipeline`: stages, options compiler, structured pipelines
//! - `query`: legacy query to pipeline translation
//! - `execution`: resumable streaming execution
//! - `observability`: structured logging

pub mod execution;
pub mod expr;
pub mod filter;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod value;
