//! Execute request types

use crate::pipeline::{PipelineOptions, StructuredPipeline};
use crate::value::Timestamp;

/// Read consistency for one execution. Exactly one selector per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consistency {
    /// Run inside an existing transaction
    Transaction(Vec<u8>),
    /// Read at a fixed point in time
    ReadTime(Timestamp),
    /// Start a new transaction and report its id
    NewTransaction,
}

impl Consistency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Consistency::Transaction(_) => "transaction",
            Consistency::ReadTime(_) => "read_time",
            Consistency::NewTransaction => "new_transaction",
        }
    }
}

/// Caller-facing execution options
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecuteOptions {
    pub pipeline_options: PipelineOptions,
    pub consistency: Option<Consistency>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline_options(mut self, options: PipelineOptions) -> Self {
        self.pipeline_options = options;
        self
    }

    pub fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }
}

/// The message sent on every (re)connection attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteRequest {
    pub database: String,
    pub structured_pipeline: StructuredPipeline,
    pub consistency: Option<Consistency>,
}
