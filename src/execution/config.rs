//! Execution Engine Configuration
//!
//! Database resource name, streaming method, decoding flag, outward
//! buffer size and log level.

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

use super::errors::{ExecutionError, ExecutionResult};

/// Execution engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Database resource name, `projects/{project}/databases/{database}`
    pub database: String,

    /// Streaming method invoked on the transport (default: "executePipeline")
    #[serde(default = "default_method_name")]
    pub method_name: String,

    /// Decode wire timestamps as native dates (default: false)
    #[serde(default)]
    pub timestamps_as_dates: bool,

    /// Outward element channel capacity (default: 64)
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// Minimum log severity (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_method_name() -> String {
    "executePipeline".to_string()
}

fn default_stream_buffer() -> usize {
    64
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl EngineConfig {
    /// Create a config for a database with all other settings defaulted
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            method_name: default_method_name(),
            timestamps_as_dates: false,
            stream_buffer: default_stream_buffer(),
            log_level: default_log_level(),
        }
    }

    /// Load from a JSON document and validate
    pub fn from_json_str(json: &str) -> ExecutionResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ExecutionError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ExecutionResult<()> {
        if self.database.trim().is_empty() {
            return Err(ExecutionError::Config("database must not be empty".into()));
        }
        if self.method_name.trim().is_empty() {
            return Err(ExecutionError::Config("method_name must not be empty".into()));
        }
        if self.stream_buffer == 0 {
            return Err(ExecutionError::Config("stream_buffer must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_timestamps_as_dates(mut self, enabled: bool) -> Self {
        self.timestamps_as_dates = enabled;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }
}
