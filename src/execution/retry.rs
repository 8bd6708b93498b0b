//! Retry policy
//!
//! Per-method retry settings consulted when classifying transport errors.
//! The engine never retries on its own; the policy only answers whether
//! an error is permanent and whether a method's retry budget is spent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::errors::{RpcCode, TransportError};

/// Retry settings for one RPC method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRetrySettings {
    /// Wall-clock budget across all attempts. Zero means unbounded.
    pub total_timeout: Duration,
    /// Codes that may be retried
    pub retryable_codes: Vec<RpcCode>,
}

impl MethodRetrySettings {
    pub fn new(total_timeout: Duration, retryable_codes: Vec<RpcCode>) -> Self {
        Self {
            total_timeout,
            retryable_codes,
        }
    }
}

/// Explicit per-method policy table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    methods: HashMap<String, MethodRetrySettings>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let streaming = MethodRetrySettings::new(
            Duration::from_secs(300),
            vec![
                RpcCode::DeadlineExceeded,
                RpcCode::Unavailable,
                RpcCode::ResourceExhausted,
                RpcCode::Internal,
            ],
        );

        Self::empty()
            .with_method("executePipeline", streaming.clone())
            .with_method("runQuery", streaming.clone())
            .with_method("batchGetDocuments", streaming)
    }
}

impl RetryPolicy {
    /// Policy with no methods; every error is permanent
    pub fn empty() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>, settings: MethodRetrySettings) -> Self {
        self.methods.insert(method.into(), settings);
        self
    }

    pub fn settings(&self, method: &str) -> Option<&MethodRetrySettings> {
        self.methods.get(method)
    }

    /// An error is permanent unless its code is retryable for the method
    pub fn is_permanent_error(&self, error: &TransportError, method: &str) -> bool {
        match self.settings(method) {
            Some(settings) => !settings.retryable_codes.contains(&error.code),
            None => true,
        }
    }

    /// Returns true once the method's total budget has elapsed since `start`.
    ///
    /// Methods without a budget never time out.
    pub fn has_retry_timed_out(&self, method: &str, start: Instant) -> bool {
        match self.settings(method) {
            Some(settings) if !settings.total_timeout.is_zero() => {
                start.elapsed() >= settings.total_timeout
            }
            _ => false,
        }
    }
}
