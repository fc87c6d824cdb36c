// crates/cogni-core/src/log.rs
// ============================================================================
// Module: Structured Redacting Logger
// Description: Dependency-light structured log events with per-delivery scope.
// Purpose: Give every component the same event shape without pulling in a
//          tracing façade, and guarantee secrets never reach a sink.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Logging here is a small, serializable event type plus a pluggable
//! [`LogSink`], in the same spirit as a telemetry-event module: no macros, no
//! implicit global subscriber. A [`Logger`] is constructed once per process
//! and [`Logger::child`] attaches structured bindings (delivery id, gate id)
//! without mutating the root. Every field value is passed through
//! [`redact`] before it is attached to an event.

use std::sync::Arc;

use serde_json::Value;

// ============================================================================
// SECTION: Levels
// ============================================================================

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Fine-grained diagnostic detail.
    Debug,
    /// Normal operational event.
    Info,
    /// Recoverable but noteworthy condition.
    Warn,
    /// Failure requiring attention.
    Error,
}

impl LogLevel {
    /// Stable label used for filtering by `LOG_LEVEL`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// A single structured log event.
///
/// # Invariants
/// - `fields` values have already passed through [`redact`].
#[derive(Debug, serde::Serialize)]
pub struct LogEvent {
    /// Severity of the event.
    pub level: LogLevel,
    /// Short, stable event name (e.g. `"gate.completed"`).
    pub message: &'static str,
    /// Structured bindings attached by the logger and its children.
    pub fields: Vec<(String, Value)>,
}

/// Sink that receives emitted log events.
///
/// Implementations must not block on a mutex held across an `await` point;
/// see `spec.md` §5.
pub trait LogSink: Send + Sync {
    /// Receives one emitted event.
    fn emit(&self, event: &LogEvent);
}

/// Sink that discards every event; the default for unit tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _event: &LogEvent) {}
}

/// Sink that appends emitted events to an in-memory buffer, for assertions.
#[derive(Default)]
pub struct CapturingSink {
    events: std::sync::Mutex<Vec<LogEvent>>,
}

impl CapturingSink {
    /// Creates an empty capturing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of every event captured so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl Clone for LogEvent {
    fn clone(&self) -> Self {
        Self {
            level: self.level,
            message: self.message,
            fields: self.fields.clone(),
        }
    }
}

impl LogSink for CapturingSink {
    fn emit(&self, event: &LogEvent) {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(event.clone());
    }
}

// ============================================================================
// SECTION: Logger
// ============================================================================

/// Structured logger with a single process-wide root and per-delivery children.
///
/// # Invariants
/// - Children never mutate the root sink or root bindings.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_level: LogLevel,
    bindings: Vec<(String, Value)>,
}

impl Logger {
    /// Creates a root logger writing to `sink`, filtering below `min_level`.
    #[must_use]
    pub fn root(sink: Arc<dyn LogSink>, min_level: LogLevel) -> Self {
        Self {
            sink,
            min_level,
            bindings: Vec::new(),
        }
    }

    /// Returns a child logger with additional structured bindings attached.
    #[must_use]
    pub fn child(&self, bindings: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        let mut merged = self.bindings.clone();
        for (key, value) in bindings {
            merged.push((key.to_string(), redact_value(key, value)));
        }
        Self {
            sink: Arc::clone(&self.sink),
            min_level: self.min_level,
            bindings: merged,
        }
    }

    /// Emits a log event at the given level with extra fields.
    pub fn log(
        &self,
        level: LogLevel,
        message: &'static str,
        fields: impl IntoIterator<Item = (&'static str, Value)>,
    ) {
        if level < self.min_level {
            return;
        }
        let mut all_fields = self.bindings.clone();
        for (key, value) in fields {
            all_fields.push((key.to_string(), redact_value(key, value)));
        }
        self.sink.emit(&LogEvent {
            level,
            message,
            fields: all_fields,
        });
    }
}

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Field-name fragments that mark a value as secret.
const REDACTED_KEY_FRAGMENTS: &[&str] =
    &["authorization", "cookie", "set-cookie", "password", "token", "secret", "apikey"];

/// Returns true when `key` names a field that must never be logged verbatim.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    REDACTED_KEY_FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
}

/// Redacts `value` if `key` names a sensitive field, otherwise returns it unchanged.
#[must_use]
pub fn redact_value(key: &str, value: Value) -> Value {
    if is_sensitive_key(key) {
        Value::String("[redacted]".to_string())
    } else {
        value
    }
}

/// Recursively redacts a JSON value: object fields named by a sensitive key
/// are masked outright, string leaves (including array/nested-object
/// leaves) pass through [`redact_text`], and every other shape is walked
/// unchanged.
///
/// Applied to violation `meta`, which carries arbitrary structured data from
/// gates and upstream tools that may echo back a secret field.
#[must_use]
pub fn redact_json(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    let redacted = if is_sensitive_key(&key) { Value::String("[redacted]".to_string()) } else { redact_json(val) };
                    (key, redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_json).collect()),
        Value::String(text) => Value::String(redact_text(&text)),
        other => other,
    }
}

/// Redacts a free-text string that may embed a sensitive key=value pair.
///
/// This is a defensive secondary pass applied to violation messages and
/// check text, which are not structured fields but may still echo back
/// something like `Authorization: Bearer xyz` from an upstream tool.
#[must_use]
pub fn redact_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (content, newline) =
            line.strip_suffix('\n').map_or((line, ""), |stripped| (stripped, "\n"));
        if let Some((key, _)) = content.split_once(':') {
            if is_sensitive_key(key.trim()) {
                out.push_str(key.trim());
                out.push_str(": [redacted]");
                out.push_str(newline);
                continue;
            }
        }
        out.push_str(content);
        out.push_str(newline);
    }
    out
}
