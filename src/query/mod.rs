//! Legacy query translation
//!
//! Classic filter/order/cursor queries expressed as pipelines.

mod ast;
mod translate;

pub use ast::{LimitType, Query, QuerySource};
