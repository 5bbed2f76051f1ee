//! Direct topic subscription: the function is invoked with SNS records and
//! routes each embedded envelope through the same event handlers the queue
//! dispatcher uses.

use anyhow::anyhow;
use event_relay_core::notification::decode_envelope;
use serde_json::{json, Value};

use crate::handlers::events::{route_envelope, EventHandler, RouteOutcome};
use crate::handlers::InvocationResponse;

pub const TOPIC_EVENT_SOURCE: &str = "aws:sns";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicEventSummary {
    pub handled: usize,
    pub unrecognized: usize,
    pub failed: usize,
    pub ignored: usize,
}

/// Per-record failures are logged and do not fail the invocation, so the
/// topic does not redeliver the whole batch.
#[tracing::instrument(skip_all)]
pub fn handle_topic_event<H: EventHandler + ?Sized>(
    event: &Value,
    handlers: &H,
) -> InvocationResponse {
    let summary = route_topic_records(event, handlers);
    tracing::info!(
        handled = summary.handled,
        unrecognized = summary.unrecognized,
        failed = summary.failed,
        ignored = summary.ignored,
        "topic records processed"
    );
    InvocationResponse::ok(json!({"message": "Processing completed"}))
}

pub fn route_topic_records<H: EventHandler + ?Sized>(
    event: &Value,
    handlers: &H,
) -> TopicEventSummary {
    let mut summary = TopicEventSummary::default();
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for (index, record) in records.iter().enumerate() {
        if !is_topic_record(record) {
            summary.ignored += 1;
            continue;
        }

        let routed = topic_message(record)
            .and_then(|message| decode_envelope(message).map_err(anyhow::Error::from))
            .and_then(|envelope| route_envelope(&envelope, handlers));

        match routed {
            Ok(RouteOutcome::Handled(_)) => summary.handled += 1,
            Ok(RouteOutcome::Unrecognized(event_type)) => {
                tracing::warn!(
                    record_index = index,
                    event_type = %event_type,
                    "unknown event type"
                );
                summary.unrecognized += 1;
            }
            Err(error) => {
                tracing::error!(record_index = index, error = ?error, "failed to process record");
                summary.failed += 1;
            }
        }
    }

    summary
}

fn is_topic_record(record: &Value) -> bool {
    record
        .get("EventSource")
        .and_then(Value::as_str)
        .map(|source| source == TOPIC_EVENT_SOURCE)
        .unwrap_or(false)
}

fn topic_message(record: &Value) -> anyhow::Result<&str> {
    record
        .get("Sns")
        .and_then(|sns| sns.get("Message"))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("topic record is missing Sns.Message"))
}
