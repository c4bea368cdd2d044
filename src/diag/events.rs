//! Key/value monitoring events.
//!
//! Emission is fire-and-forget: sinks never report failure back to the producer.

use parking_lot::Mutex;

/// Value carried by a [`MonitorEvent`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum EventValue {
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Str(String),
}

impl std::fmt::Display for EventValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventValue::Int(v) => write!(f, "{v}"),
            EventValue::Float(v) => write!(f, "{v}"),
            EventValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for EventValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for EventValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for EventValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for EventValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for EventValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// One observation, addressed by a slash separated path such as `file/video/width`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MonitorEvent {
    /// Event path.
    pub path: String,
    /// Event value.
    pub value: EventValue,
}

impl MonitorEvent {
    /// Create an event.
    pub fn new(path: impl Into<String>, value: impl Into<EventValue>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Destination for monitoring events.
pub trait EventSink: Send + Sync {
    /// Record `event`.
    fn emit(&self, event: MonitorEvent);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: MonitorEvent) {}
}

/// Forwards events to `tracing` at debug level under the `playout::monitor` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: MonitorEvent) {
        tracing::debug!(target: "playout::monitor", path = %event.path, value = %event.value);
    }
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl MemoryEventSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded event.
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().clone()
    }

    /// Remove and return every recorded event.
    pub fn take(&self) -> Vec<MonitorEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Most recent value recorded under `path`.
    pub fn last(&self, path: &str) -> Option<EventValue> {
        self.events
            .lock()
            .iter()
            .rev()
            .find(|e| e.path == path)
            .map(|e| e.value.clone())
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: MonitorEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/diag/events.rs"]
mod tests;
