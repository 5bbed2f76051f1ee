use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const ENVELOPE_VERSION: &str = "1.0";

/// The closed set of event kinds the relay publishes and dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrderCreated,
    PaymentProcessed,
    SystemAlert,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::OrderCreated,
        EventKind::PaymentProcessed,
        EventKind::SystemAlert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OrderCreated => "order_created",
            Self::PaymentProcessed => "payment_processed",
            Self::SystemAlert => "system_alert",
        }
    }

    /// Exact, case-sensitive match against the wire name.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope published to the topic. Built once per publish call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub event_id: String,
    pub event_type: EventKind,
    pub timestamp: String,
    pub version: String,
    pub data: Value,
}

impl EventEnvelope {
    pub fn new(kind: EventKind, data: Value) -> Self {
        Self::with_clock(kind, data, process_clock())
    }

    pub fn with_clock(kind: EventKind, data: Value, clock: &EventClock) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: kind,
            timestamp: format_timestamp(clock.now()),
            version: ENVELOPE_VERSION.to_string(),
            data,
        }
    }
}

/// Envelope as seen by a consumer. Only the fields routing reads are
/// decoded; `event_type` stays raw so a non-string value routes as
/// unrecognized instead of failing the whole envelope.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReceivedEnvelope {
    #[serde(default)]
    pub event_type: Option<Value>,
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl ReceivedEnvelope {
    pub fn kind(&self) -> Option<EventKind> {
        self.event_type
            .as_ref()
            .and_then(Value::as_str)
            .and_then(EventKind::from_wire)
    }

    /// Wire value for logging, `"<missing>"` when absent or null.
    pub fn event_type_label(&self) -> String {
        match &self.event_type {
            None | Some(Value::Null) => "<missing>".to_string(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Wall clock that never hands out an instant earlier than one it already
/// issued, so envelope timestamps are non-decreasing within a process.
#[derive(Debug)]
pub struct EventClock {
    last_issued_micros: AtomicI64,
}

impl EventClock {
    pub const fn new() -> Self {
        Self {
            last_issued_micros: AtomicI64::new(i64::MIN),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.observe(Utc::now())
    }

    fn observe(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let candidate = wall.timestamp_micros();
        let previous = self
            .last_issued_micros
            .fetch_max(candidate, Ordering::SeqCst);
        if previous <= candidate {
            return wall;
        }
        DateTime::from_timestamp_micros(previous).unwrap_or(wall)
    }
}

impl Default for EventClock {
    fn default() -> Self {
        Self::new()
    }
}

static PROCESS_CLOCK: EventClock = EventClock::new();

pub fn process_clock() -> &'static EventClock {
    &PROCESS_CLOCK
}

/// RFC 3339, UTC, microsecond precision. Fixed width, so lexical order
/// matches temporal order.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
