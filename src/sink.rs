//! Log sink handed to the components that report per-entry results.
//!
//! The mover and the scanner never reach for a global logger; they are given
//! a [`LogSink`]. Production code uses [`TracingSink`], tests capture events
//! with [`MemorySink`].

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::Level;

/// A destination for leveled, structured log events.
pub trait LogSink: Send + Sync {
    /// Records one event. `fields` are key/value pairs attached to it.
    fn log(&self, level: Level, message: &str, fields: &[(&str, String)]);
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn LogSink>;

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

struct Fields<'a>(&'a [(&'a str, String)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str, fields: &[(&str, String)]) {
        let fields = Fields(fields);
        match level {
            Level::ERROR => tracing::error!(%fields, "{}", message),
            Level::WARN => tracing::warn!(%fields, "{}", message),
            Level::INFO => tracing::info!(%fields, "{}", message),
            Level::DEBUG => tracing::debug!(%fields, "{}", message),
            _ => tracing::trace!(%fields, "{}", message),
        }
    }
}

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Looks up a field value by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps every event in memory.
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
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Returns the records logged at exactly `level`.
    pub fn at_level(&self, level: Level) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str, fields: &[(&str, String)]) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                level,
                message: message.to_string(),
                fields: fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            });
        }
    }
}
