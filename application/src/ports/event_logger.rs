//! Port for structured cascade diagnostics.
//!
//! Defines the [`EventLogger`] trait for recording what happened during a
//! cascade run (cache hits, tier demotions, which tier answered) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the events
//! in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured cascade event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The writer adds the timestamp.
#[derive(Debug, Clone)]
pub struct CascadeEvent {
    /// Event type identifier (e.g., "tier_demoted", "tier_selected", "cache_hit").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl CascadeEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging cascade events.
///
/// The `log` method is synchronous and non-fallible so that a broken log
/// never affects the answer stream; write failures are ignored.
pub trait EventLogger: Send + Sync {
    /// Record an event.
    fn log(&self, event: CascadeEvent);
}

/// No-op implementation for tests and when event logging is disabled.
pub struct NoEventLogger;

impl EventLogger for NoEventLogger {
    fn log(&self, _event: CascadeEvent) {}
}
