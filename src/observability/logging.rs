//! Structured logging.
//!
//! # Responsibilities
//! - Severity levels for hook output
//! - `Logger` handle handed to hooks, backed by a pluggable `LogSink`
//! - Initialize the tracing subscriber for binaries
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Hook payloads travel as JSON values and are rendered as one `http` field
//! - Unknown level names or values fall back to INFO instead of failing

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::observability::record::HTTP_LOG_KEY;

/// Severity of a hook log entry.
///
/// Numeric values follow the conventional 10-step scale so hosts that carry
/// levels as integers can convert with [`LogLevel::from_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

/// Error returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized log level: {0:?}")]
pub struct ParseLogLevelError(String);

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// Numeric value of the level (DEBUG=10 … CRITICAL=50).
    pub fn value(self) -> u8 {
        match self {
            LogLevel::Debug => 10,
            LogLevel::Info => 20,
            LogLevel::Warning => 30,
            LogLevel::Error => 40,
            LogLevel::Critical => 50,
        }
    }

    /// Level for an exact numeric value, if any.
    pub fn from_value(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|level| i64::from(level.value()) == value)
    }

    /// Parse a level name, falling back to INFO for anything unrecognized.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: ParseLogLevelError| {
            tracing::warn!(error = %e, "Falling back to INFO log level");
            LogLevel::Info
        })
    }

    /// Numeric counterpart of [`LogLevel::from_name_or_default`].
    pub fn from_value_or_default(value: i64) -> Self {
        Self::from_value(value).unwrap_or_else(|| {
            tracing::warn!(value, "Unrecognized numeric log level, falling back to INFO");
            LogLevel::Info
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Closest `tracing` level. CRITICAL has no counterpart and maps to ERROR.
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

/// One entry written through a [`Logger`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub logger: String,
    pub level: LogLevel,
    pub message: String,
    pub payload: Option<Value>,
}

impl LogEntry {
    /// The `http` section of the payload, when the entry carries a log record.
    pub fn http(&self) -> Option<&Value> {
        self.payload.as_ref()?.get(HTTP_LOG_KEY)
    }
}

/// Destination for entries written by hooks.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: &LogEntry);
}

/// Sink that forwards entries to the `tracing` dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit_event {
    ($level:ident, $entry:expr, $payload:expr) => {
        match $payload {
            Some(payload) => tracing::$level!(
                logger = %$entry.logger,
                http = %payload,
                "{}",
                $entry.message
            ),
            None => tracing::$level!(logger = %$entry.logger, "{}", $entry.message),
        }
    };
}

impl LogSink for TracingSink {
    fn emit(&self, entry: &LogEntry) {
        let payload = entry
            .payload
            .as_ref()
            .map(|p| p.get(HTTP_LOG_KEY).unwrap_or(p).to_string());

        match entry.level {
            LogLevel::Debug => emit_event!(debug, entry, payload),
            LogLevel::Info => emit_event!(info, entry, payload),
            LogLevel::Warning => emit_event!(warn, entry, payload),
            LogLevel::Error | LogLevel::Critical => emit_event!(error, entry, payload),
        }
    }
}

/// Sink that keeps every entry in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All entries captured so far, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Entries whose message equals `message`.
    pub fn with_message(&self, message: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }

    /// Entries whose message contains `needle`.
    pub fn containing(&self, needle: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.message.contains(needle))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // A panicking writer cannot leave a Vec half-pushed.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: &LogEntry) {
        self.lock().push(entry.clone());
    }
}

/// Named logging handle handed to hooks.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(name: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            name: Arc::from(name.into()),
            sink,
        }
    }

    /// Logger writing to `tracing`.
    pub fn tracing(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(TracingSink))
    }

    /// Logger writing to a fresh [`MemorySink`], returned alongside it.
    pub fn memory(name: impl Into<String>) -> (Self, Arc<MemorySink>) {
        let sink = MemorySink::new();
        (Self::new(name, sink.clone()), sink)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, payload: Option<Value>) {
        self.sink.emit(&LogEntry {
            logger: self.name.to_string(),
            level,
            message: message.into(),
            payload,
        });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::tracing("logging_http_client")
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_names_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(level.name().parse::<LogLevel>().unwrap(), level);
        }
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(" debug ".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    }

    #[test]
    fn test_invalid_levels_fall_back_to_info() {
        for name in ["INVALID", "INFODEBUG", ""] {
            assert_eq!(LogLevel::from_name_or_default(name), LogLevel::Info);
        }
        for value in [60, 11, 35, 45, 11010210120201, -1] {
            assert_eq!(LogLevel::from_value_or_default(value), LogLevel::Info);
        }
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(LogLevel::from_value(10), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_value(50), Some(LogLevel::Critical));
        assert_eq!(LogLevel::from_value(25), None);
        assert_eq!(LogLevel::default().value(), 20);
    }

    #[test]
    fn test_critical_maps_to_tracing_error() {
        assert_eq!(LogLevel::Critical.as_tracing(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warning.as_tracing(), tracing::Level::WARN);
    }

    #[test]
    fn test_memory_sink_captures_entries() {
        let (logger, sink) = Logger::memory("test");
        logger.info("first");
        logger.log(
            LogLevel::Warning,
            "REQUEST",
            Some(json!({ "http": { "request_method": "GET" } })),
        );

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].logger, "test");
        assert!(entries[0].http().is_none());

        let request = sink.with_message("REQUEST");
        assert_eq!(request.len(), 1);
        assert_eq!(request[0].level, LogLevel::Warning);
        assert_eq!(request[0].http().unwrap()["request_method"], "GET");

        sink.clear();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        let logger = Logger::default();
        for level in LogLevel::ALL {
            logger.log(level, "message", Some(json!({ "http": { "a": 1 } })));
            logger.log(level, "message", None);
        }
    }
}
