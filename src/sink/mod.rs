//! Output sinks.
//!
//! A sink receives every discovered entity and every reported error as a
//! [`Record`]. `StdoutSink` prints one compact JSON document per record,
//! which is what an agent like Zabbix consumes.

use serde::Serialize;
use serde_json::Value;
use std::io::Write;

use crate::error::CommandError;

/// Error descriptor delivered to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl From<&CommandError> for ErrorRecord {
    fn from(err: &CommandError) -> Self {
        ErrorRecord::new(err.kind(), err.to_string())
    }
}

/// Anything a sink can be asked to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Entity(Value),
    Error(ErrorRecord),
}

impl Record {
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Record::Error(ErrorRecord::new(kind, message))
    }

    /// JSON rendering used by line-oriented sinks.
    pub fn to_json(&self) -> Value {
        match self {
            Record::Entity(v) => v.clone(),
            Record::Error(e) => serde_json::json!({
                "status": "error",
                "kind": e.kind,
                "error": e.message,
            }),
        }
    }
}

impl From<CommandError> for Record {
    fn from(err: CommandError) -> Self {
        Record::Error(ErrorRecord::from(&err))
    }
}

/// Consumer of discovery output. Shared across every discovery instance.
pub trait Sink: Send + Sync {
    fn process(&self, record: Record);
}

/// Writes each record as a single JSON line on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn process(&self, record: Record) {
        let line = record.to_json().to_string();
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            tracing::error!(error = %e, "failed to write record to stdout");
        }
    }
}
