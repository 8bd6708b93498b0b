//! Structured JSON logger
//!
//! - One JSON object per line
//! - `event` first, then `severity`, then fields sorted by key
//! - ERROR and FATAL go to stderr, everything else to stdout
//! - Lines below the logger's minimum severity are dropped

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Per-frame detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger with a minimum severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    min_severity: Severity,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl Logger {
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    /// Log an event at its default severity
    pub fn event(&self, event: Event, fields: &[(&str, &str)]) {
        self.log(event.severity(), event.as_str(), fields);
    }

    /// Log with an explicit severity
    pub fn log(&self, severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !self.enabled(severity) {
            return;
        }
        if severity >= Severity::Error {
            write_line(severity, event, fields, &mut io::stderr());
        } else {
            write_line(severity, event, fields, &mut io::stdout());
        }
    }
}

/// Render one log line into `writer`
fn write_line<W: Write>(severity: Severity, event: &str, fields: &[(&str, &str)], writer: &mut W) {
    let line = render(severity, event, fields);
    // Logging must never fail the caller
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}

fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(128);

    output.push_str("{\"event\":\"");
    escape_json_string(&mut output, event);
    output.push_str("\",\"severity\":\"");
    output.push_str(severity.as_str());
    output.push('"');

    let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    for (key, value) in sorted {
        output.push_str(",\"");
        escape_json_string(&mut output, key);
        output.push_str("\":\"");
        escape_json_string(&mut output, value);
        output.push('"');
    }

    output.push_str("}\n");
    output
}

fn escape_json_string(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => output.push_str(&format!("\\u{:04x}", c as u32)),
            c => output.push(c),
        }
    }
}
