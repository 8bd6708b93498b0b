//! # Pipeline Construction
//!
//! Stages, pipelines, the options compiler and structured pipeline
//! assembly. Everything here is pure and raises errors before any network
//! call.

mod options;
mod stage;
mod structured;

pub use options::{
    parse_field_path, KnownOption, KnownOptionsSchema, OptionsCompiler, PipelineOptions,
};
pub use stage::{stages, Pipeline, Stage};
pub use structured::{execute_options_schema, StructuredPipeline};
