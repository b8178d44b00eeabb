//! Diagnostic sinks for the pathfinding engine.
//!
//! The engine never prints on its own. Every diagnostic goes through a [`LogSink`]
//! as a `(severity, tag, message)` triple; the engine ignores whatever the sink does
//! with it. [`TracingSink`] forwards to `tracing` and is the default for new grids.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of an engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Caller misuse, such as an out-of-bounds coordinate.
    Error,
    /// Degraded operation, such as a dropped heap push.
    Warning,
    /// Step tracing.
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Debug => write!(f, "DEBUG"),
        }
    }
}

/// Receiver for engine diagnostics.
pub trait LogSink: Send + Sync {
    /// Records one diagnostic.
    fn log(&self, severity: Severity, tag: &str, message: &str);

    /// Returns false when messages of `severity` would be discarded, letting the engine
    /// skip formatting them.
    fn enabled(&self, _severity: Severity) -> bool {
        true
    }
}

/// Shared handle to a sink, as stored by the grid.
pub type SharedSink = Arc<dyn LogSink>;

/// Forwards diagnostics to the `tracing` subscriber installed by the application.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: Severity, tag: &str, message: &str) {
        match severity {
            Severity::Error => tracing::error!(tag, "{}", message),
            Severity::Warning => tracing::warn!(tag, "{}", message),
            Severity::Debug => tracing::debug!(tag, "{}", message),
        }
    }

    fn enabled(&self, severity: Severity) -> bool {
        match severity {
            Severity::Error => tracing::enabled!(tracing::Level::ERROR),
            Severity::Warning => tracing::enabled!(tracing::Level::WARN),
            Severity::Debug => tracing::enabled!(tracing::Level::DEBUG),
        }
    }
}

/// One diagnostic captured by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub tag: String,
    pub message: String,
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Number of records logged with `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, severity: Severity, tag: &str, message: &str) {
        self.records.lock().push(LogRecord {
            severity,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.log(Severity::Error, "grid", "first");
        sink.log(Severity::Debug, "search", "second");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, "grid");
        assert_eq!(records[1].message, "second");
        assert_eq!(sink.count(Severity::Error), 1);
        assert_eq!(sink.count(Severity::Warning), 0);

        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_tracing_sink_without_subscriber() {
        let sink = TracingSink;
        let _ = sink.enabled(Severity::Debug);
        sink.log(Severity::Error, "grid", "dropped");
        sink.log(Severity::Debug, "grid", "dropped");
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }
}
