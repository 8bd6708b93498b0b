//! Pipeline lifecycle events
//!
//! Events are explicit and typed; each carries a default severity.

use std::fmt;

use super::logger::Severity;

/// Observable events of pipeline execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Execution requested, before preconditions are awaited
    ExecuteStart,
    /// A server stream was opened
    StreamOpen,
    /// The stream ended without a terminal signal and is re-opened
    StreamReconnect,
    /// One response frame was decoded
    FrameReceived,
    /// The stream finished normally
    StreamComplete,
    /// The transport reported an error
    StreamFailed,
    /// Client or decoder initialization failed
    PreconditionFailed,
    /// The consumer dropped the outward stream
    StreamCancelled,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ExecuteStart => "PIPELINE_EXECUTE_START",
            Event::StreamOpen => "PIPELINE_STREAM_OPEN",
            Event::StreamReconnect => "PIPELINE_STREAM_RECONNECT",
            Event::FrameReceived => "PIPELINE_FRAME_RECEIVED",
            Event::StreamComplete => "PIPELINE_STREAM_COMPLETE",
            Event::StreamFailed => "PIPELINE_STREAM_FAILED",
            Event::PreconditionFailed => "PIPELINE_PRECONDITION_FAILED",
            Event::StreamCancelled => "PIPELINE_STREAM_CANCELLED",
        }
    }

    /// Severity used when the event is logged
    pub fn severity(&self) -> Severity {
        match self {
            Event::FrameReceived => Severity::Trace,
            Event::ExecuteStart
            | Event::StreamOpen
            | Event::StreamComplete
            | Event::StreamCancelled => Severity::Info,
            Event::StreamReconnect => Severity::Warn,
            Event::StreamFailed | Event::PreconditionFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::StreamReconnect.as_str(), "PIPELINE_STREAM_RECONNECT");
        assert_eq!(Event::PreconditionFailed.to_string(), "PIPELINE_PRECONDITION_FAILED");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::FrameReceived.severity(), Severity::Trace);
        assert_eq!(Event::StreamReconnect.severity(), Severity::Warn);
        assert_eq!(Event::StreamFailed.severity(), Severity::Error);
    }
}
