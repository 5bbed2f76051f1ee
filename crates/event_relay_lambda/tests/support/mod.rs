#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::anyhow;
use event_relay_core::attributes::PublishRequest;
use event_relay_core::contract::EventKind;
use event_relay_core::notification::TopicNotification;
use event_relay_core::storage_event::TableRow;
use event_relay_lambda::adapters::queue::{QueueClient, QueueMessage};
use event_relay_lambda::adapters::table::RowStore;
use event_relay_lambda::adapters::topic::TopicPublisher;
use event_relay_lambda::handlers::events::EventHandler;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub const TOPIC_ARN: &str = "arn:aws:sns:ap-south-1:000000000000:events";

/// Topic fake that keeps every publish request in order.
#[derive(Default)]
pub struct CapturingTopic {
    requests: Mutex<Vec<PublishRequest>>,
}

impl CapturingTopic {
    pub fn requests(&self) -> Vec<PublishRequest> {
        self.requests.lock().expect("poisoned mutex").clone()
    }

    /// Fans the captured messages out as queue messages, the way a
    /// non-raw queue subscription receives them.
    pub fn as_queue_messages(&self) -> Vec<QueueMessage> {
        self.requests()
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let notification =
                    TopicNotification::wrap(format!("sns-{index}"), TOPIC_ARN, request.message);
                QueueMessage {
                    message_id: Some(format!("msg-{index}")),
                    receipt_handle: Some(format!("rh-{index}")),
                    body: Some(
                        serde_json::to_string(&notification).expect("notification serializes"),
                    ),
                }
            })
            .collect()
    }
}

impl TopicPublisher for CapturingTopic {
    fn publish(&self, request: &PublishRequest) -> anyhow::Result<String> {
        let mut requests = self.requests.lock().expect("poisoned mutex");
        requests.push(request.clone());
        Ok(format!("sns-{}", requests.len() - 1))
    }
}

/// Queue fake that replays scripted batches and cancels `stop` once they run
/// out, so `QueueDispatcher::run` returns.
pub struct ScriptedQueue {
    batches: Mutex<VecDeque<anyhow::Result<Vec<QueueMessage>>>>,
    deleted: Mutex<Vec<String>>,
    stop: CancellationToken,
}

impl ScriptedQueue {
    pub fn new(batches: Vec<anyhow::Result<Vec<QueueMessage>>>, stop: CancellationToken) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            deleted: Mutex::new(Vec::new()),
            stop,
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("poisoned mutex").clone()
    }
}

impl QueueClient for ScriptedQueue {
    fn receive_messages(
        &self,
        _max_messages: i32,
        _wait_time_seconds: i32,
    ) -> anyhow::Result<Vec<QueueMessage>> {
        let mut batches = self.batches.lock().expect("poisoned mutex");
        let next = batches.pop_front().unwrap_or_else(|| Ok(Vec::new()));
        if batches.is_empty() {
            self.stop.cancel();
        }
        next
    }

    fn delete_message(&self, receipt_handle: &str) -> anyhow::Result<()> {
        self.deleted
            .lock()
            .expect("poisoned mutex")
            .push(receipt_handle.to_string());
        Ok(())
    }
}

/// Handler that records each routed payload and optionally rejects one kind.
#[derive(Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<(EventKind, Value)>>,
    reject: Option<EventKind>,
}

impl RecordingHandler {
    pub fn rejecting(kind: EventKind) -> Self {
        Self {
            reject: Some(kind),
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<(EventKind, Value)> {
        self.seen.lock().expect("poisoned mutex").clone()
    }

    fn record(&self, kind: EventKind, data: &Value) -> anyhow::Result<()> {
        if self.reject == Some(kind) {
            return Err(anyhow!("{kind} handler failed"));
        }
        self.seen
            .lock()
            .expect("poisoned mutex")
            .push((kind, data.clone()));
        Ok(())
    }
}

impl EventHandler for RecordingHandler {
    fn handle_order_created(&self, data: &Value) -> anyhow::Result<()> {
        self.record(EventKind::OrderCreated, data)
    }

    fn handle_payment_processed(&self, data: &Value) -> anyhow::Result<()> {
        self.record(EventKind::PaymentProcessed, data)
    }

    fn handle_system_alert(&self, data: &Value) -> anyhow::Result<()> {
        self.record(EventKind::SystemAlert, data)
    }
}

#[derive(Default)]
pub struct CapturingStore {
    rows: Mutex<Vec<TableRow>>,
}

impl CapturingStore {
    pub fn rows(&self) -> Vec<TableRow> {
        self.rows.lock().expect("poisoned mutex").clone()
    }
}

impl RowStore for CapturingStore {
    fn put_row(&self, row: &TableRow) -> anyhow::Result<()> {
        self.rows.lock().expect("poisoned mutex").push(row.clone());
        Ok(())
    }
}
