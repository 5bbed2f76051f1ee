//! Long-running queue dispatcher.
//!
//! Each received message moves through
//! `Received -> Parsed -> Routed -> {Completed | Failed}`. Completed messages
//! are deleted by receipt handle; failed ones stay in the queue and become
//! visible again once the queue's visibility timeout expires. Redelivery
//! limits and dead-lettering belong to the queue configuration.

use anyhow::anyhow;
use event_relay_core::notification::unwrap_queue_body;
use tokio_util::sync::CancellationToken;

use crate::adapters::queue::{QueueClient, QueueMessage};
use crate::handlers::events::{route_envelope, EventHandler, RouteOutcome};

pub const DEFAULT_MAX_MESSAGES: i32 = 10;
pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 20;

/// What to do with a message whose `event_type` is absent or unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownEventPolicy {
    /// Log and delete; unknown types are not worth retrying.
    #[default]
    Delete,
    /// Log and leave for redelivery.
    Retain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub unknown_event_policy: UnknownEventPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            wait_time_seconds: DEFAULT_WAIT_TIME_SECONDS,
            unknown_event_policy: UnknownEventPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Deleted,
    Retained,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub received: usize,
    pub deleted: usize,
    pub retained: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Deleted => self.deleted += 1,
            MessageOutcome::Retained => self.retained += 1,
        }
    }
}

pub struct QueueDispatcher<Q, H> {
    queue: Q,
    handlers: H,
    config: DispatcherConfig,
}

impl<Q: QueueClient, H: EventHandler> QueueDispatcher<Q, H> {
    pub fn new(queue: Q, handlers: H, config: DispatcherConfig) -> Self {
        Self {
            queue,
            handlers,
            config,
        }
    }

    /// Polls until `stop` is cancelled. The token is checked between polls,
    /// so shutdown waits for the in-flight receive and batch to finish.
    /// Receive failures are logged and polling resumes immediately.
    pub fn run(&self, stop: &CancellationToken) {
        tracing::info!(
            max_messages = self.config.max_messages,
            wait_time_seconds = self.config.wait_time_seconds,
            "starting to listen to queue"
        );

        while !stop.is_cancelled() {
            match self.poll_once() {
                Ok(summary) if summary.received > 0 => {
                    tracing::info!(
                        received = summary.received,
                        deleted = summary.deleted,
                        retained = summary.retained,
                        "batch processed"
                    );
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::error!(error = ?error, "error receiving messages");
                }
            }
        }

        tracing::info!("queue listener stopped");
    }

    /// One receive call followed by sequential processing of the batch.
    pub fn poll_once(&self) -> anyhow::Result<BatchSummary> {
        let messages = self
            .queue
            .receive_messages(self.config.max_messages, self.config.wait_time_seconds)?;

        let mut summary = BatchSummary {
            received: messages.len(),
            ..BatchSummary::default()
        };
        if messages.is_empty() {
            return Ok(summary);
        }

        tracing::info!(count = messages.len(), "received messages");
        for message in &messages {
            summary.record(self.process_message(message));
        }

        Ok(summary)
    }

    #[tracing::instrument(
        skip_all,
        fields(message_id = message.message_id.as_deref().unwrap_or("unknown"))
    )]
    pub fn process_message(&self, message: &QueueMessage) -> MessageOutcome {
        let routed = unwrap_queue_body(message.body.as_deref())
            .map_err(anyhow::Error::from)
            .and_then(|envelope| route_envelope(&envelope, &self.handlers));

        match routed {
            Ok(RouteOutcome::Handled(_)) => {}
            Ok(RouteOutcome::Unrecognized(event_type)) => {
                tracing::warn!(event_type = %event_type, "unknown event type");
                if self.config.unknown_event_policy == UnknownEventPolicy::Retain {
                    return MessageOutcome::Retained;
                }
            }
            Err(error) => {
                tracing::error!(error = ?error, "error processing message; leaving for redelivery");
                return MessageOutcome::Retained;
            }
        }

        match self.delete(message) {
            Ok(()) => {
                tracing::info!("message processed and deleted");
                MessageOutcome::Deleted
            }
            Err(error) => {
                tracing::error!(error = ?error, "error deleting processed message");
                MessageOutcome::Retained
            }
        }
    }

    fn delete(&self, message: &QueueMessage) -> anyhow::Result<()> {
        let receipt_handle = message
            .receipt_handle
            .as_deref()
            .ok_or_else(|| anyhow!("no receipt handle found for message"))?;
        self.queue.delete_message(receipt_handle)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use event_relay_core::notification::TopicNotification;
    use serde_json::{json, Value};

    use super::*;

    struct ScriptedQueue {
        batches: Mutex<VecDeque<anyhow::Result<Vec<QueueMessage>>>>,
        deleted: Mutex<Vec<String>>,
        receive_calls: Mutex<Vec<(i32, i32)>>,
        stop: CancellationToken,
    }

    impl ScriptedQueue {
        fn new(batches: Vec<anyhow::Result<Vec<QueueMessage>>>, stop: CancellationToken) -> Self {
            Self {
                batches: Mutex::new(batches.into()),
                deleted: Mutex::new(Vec::new()),
                receive_calls: Mutex::new(Vec::new()),
                stop,
            }
        }

        fn deleted(&self) -> Vec<String> {
            self.deleted.lock().expect("poisoned mutex").clone()
        }

        fn receive_calls(&self) -> Vec<(i32, i32)> {
            self.receive_calls.lock().expect("poisoned mutex").clone()
        }
    }

    impl QueueClient for ScriptedQueue {
        fn receive_messages(
            &self,
            max_messages: i32,
            wait_time_seconds: i32,
        ) -> anyhow::Result<Vec<QueueMessage>> {
            self.receive_calls
                .lock()
                .expect("poisoned mutex")
                .push((max_messages, wait_time_seconds));
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

    /// Fails every handler call for the kinds listed in `failing`.
    struct SelectiveHandler {
        failing: Vec<&'static str>,
    }

    impl SelectiveHandler {
        fn check(&self, kind: &'static str) -> anyhow::Result<()> {
            if self.failing.contains(&kind) {
                Err(anyhow!("{kind} handler failed"))
            } else {
                Ok(())
            }
        }
    }

    impl EventHandler for SelectiveHandler {
        fn handle_order_created(&self, _data: &Value) -> anyhow::Result<()> {
            self.check("order_created")
        }

        fn handle_payment_processed(&self, _data: &Value) -> anyhow::Result<()> {
            self.check("payment_processed")
        }

        fn handle_system_alert(&self, _data: &Value) -> anyhow::Result<()> {
            self.check("system_alert")
        }
    }

    fn message(receipt: &str, event_type: &str) -> QueueMessage {
        envelope_message(
            receipt,
            json!({
                "event_id": format!("evt-{receipt}"),
                "event_type": event_type,
                "timestamp": "2026-02-14T12:00:00.000000Z",
                "version": "1.0",
                "data": {}
            }),
        )
    }

    fn envelope_message(receipt: &str, envelope: Value) -> QueueMessage {
        let body = serde_json::to_string(&TopicNotification::wrap(
            format!("sns-{receipt}"),
            "arn:aws:sns:ap-south-1:000000000000:events",
            envelope.to_string(),
        ))
        .expect("notification should serialize");

        QueueMessage {
            message_id: Some(format!("msg-{receipt}")),
            receipt_handle: Some(receipt.to_string()),
            body: Some(body),
        }
    }

    fn build_dispatcher(
        batches: Vec<anyhow::Result<Vec<QueueMessage>>>,
        failing: Vec<&'static str>,
        config: DispatcherConfig,
    ) -> (QueueDispatcher<ScriptedQueue, SelectiveHandler>, CancellationToken) {
        let stop = CancellationToken::new();
        let queue = ScriptedQueue::new(batches, stop.clone());
        (
            QueueDispatcher::new(queue, SelectiveHandler { failing }, config),
            stop,
        )
    }

    #[test]
    fn deletes_message_once_when_handler_succeeds() {
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![message("r-1", "order_created")])],
            vec![],
            DispatcherConfig::default(),
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(
            summary,
            BatchSummary {
                received: 1,
                deleted: 1,
                retained: 0
            }
        );
        assert_eq!(dispatcher.queue.deleted(), vec!["r-1".to_string()]);
    }

    #[test]
    fn never_deletes_message_when_handler_fails() {
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![
                message("r-1", "payment_processed"),
                message("r-2", "system_alert"),
            ])],
            vec!["payment_processed"],
            DispatcherConfig::default(),
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(summary.retained, 1);
        assert_eq!(dispatcher.queue.deleted(), vec!["r-2".to_string()]);
    }

    #[test]
    fn unknown_event_types_are_deleted_by_default() {
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![message("r-1", "refund_issued")])],
            vec![],
            DispatcherConfig::default(),
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(summary.deleted, 1);
        assert_eq!(dispatcher.queue.deleted(), vec!["r-1".to_string()]);
    }

    #[test]
    fn unknown_event_types_can_be_retained() {
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![message("r-1", "refund_issued")])],
            vec![],
            DispatcherConfig {
                unknown_event_policy: UnknownEventPolicy::Retain,
                ..DispatcherConfig::default()
            },
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(summary.retained, 1);
        assert!(dispatcher.queue.deleted().is_empty());
    }

    #[test]
    fn malformed_bodies_are_left_for_redelivery() {
        let malformed = [
            QueueMessage {
                message_id: Some("m-1".to_string()),
                receipt_handle: Some("r-1".to_string()),
                body: Some("not json".to_string()),
            },
            QueueMessage {
                message_id: Some("m-2".to_string()),
                receipt_handle: Some("r-2".to_string()),
                body: Some(json!({"Message": "{broken"}).to_string()),
            },
            QueueMessage {
                message_id: Some("m-3".to_string()),
                receipt_handle: Some("r-3".to_string()),
                body: None,
            },
        ];
        let (dispatcher, _stop) =
            build_dispatcher(vec![Ok(malformed.to_vec())], vec![], DispatcherConfig::default());

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(summary.received, 3);
        assert_eq!(summary.retained, 3);
        assert!(dispatcher.queue.deleted().is_empty());
    }

    #[test]
    fn unread_envelope_fields_of_any_type_do_not_block_dispatch() {
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![envelope_message(
                "r-1",
                json!({
                    "event_id": 42,
                    "event_type": "order_created",
                    "version": 1,
                    "data": {"order_id": "ORD-001"}
                }),
            )])],
            vec![],
            DispatcherConfig::default(),
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(summary.deleted, 1);
        assert_eq!(dispatcher.queue.deleted(), vec!["r-1".to_string()]);
    }

    #[test]
    fn non_string_event_type_is_deleted_as_unknown() {
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![envelope_message("r-1", json!({"event_type": 7}))])],
            vec!["order_created", "payment_processed", "system_alert"],
            DispatcherConfig::default(),
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");

        assert_eq!(summary.deleted, 1);
        assert_eq!(dispatcher.queue.deleted(), vec!["r-1".to_string()]);
    }

    #[test]
    fn message_without_receipt_handle_is_retained() {
        let mut without_handle = message("r-1", "order_created");
        without_handle.receipt_handle = None;
        let (dispatcher, _stop) = build_dispatcher(
            vec![Ok(vec![without_handle])],
            vec![],
            DispatcherConfig::default(),
        );

        let summary = dispatcher.poll_once().expect("poll should succeed");
        assert_eq!(summary.retained, 1);
    }

    #[test]
    fn run_survives_receive_errors_and_stops_on_cancel() {
        let (dispatcher, stop) = build_dispatcher(
            vec![
                Err(anyhow!("queue unreachable")),
                Ok(vec![]),
                Ok(vec![message("r-1", "system_alert")]),
            ],
            vec![],
            DispatcherConfig::default(),
        );

        dispatcher.run(&stop);

        assert!(stop.is_cancelled());
        assert_eq!(dispatcher.queue.receive_calls().len(), 3);
        assert_eq!(dispatcher.queue.deleted(), vec!["r-1".to_string()]);
    }

    #[test]
    fn run_uses_configured_batch_size_and_wait_time() {
        let (dispatcher, stop) =
            build_dispatcher(vec![Ok(vec![])], vec![], DispatcherConfig::default());

        dispatcher.run(&stop);

        assert_eq!(
            dispatcher.queue.receive_calls(),
            vec![(DEFAULT_MAX_MESSAGES, DEFAULT_WAIT_TIME_SECONDS)]
        );
    }

    #[test]
    fn run_returns_immediately_when_already_cancelled() {
        let (dispatcher, stop) =
            build_dispatcher(vec![Ok(vec![])], vec![], DispatcherConfig::default());
        stop.cancel();

        dispatcher.run(&stop);

        assert!(dispatcher.queue.receive_calls().is_empty());
    }
}
