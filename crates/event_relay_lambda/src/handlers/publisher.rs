use anyhow::Context;
use event_relay_core::attributes::build_publish_request;
use event_relay_core::contract::{process_clock, EventClock, EventEnvelope, EventKind};
use serde_json::Value;

use crate::adapters::topic::TopicPublisher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub message_id: String,
    pub event_id: String,
}

/// Wraps payloads in an envelope and submits them to a topic. Submission
/// errors go straight back to the caller.
pub struct EventPublisher<P> {
    topic: P,
    clock: &'static EventClock,
}

impl<P: TopicPublisher> EventPublisher<P> {
    pub fn new(topic: P) -> Self {
        Self {
            topic,
            clock: process_clock(),
        }
    }

    pub fn publish_order_event(
        &self,
        topic_arn: &str,
        order_data: Value,
    ) -> anyhow::Result<PublishReceipt> {
        self.publish_event(topic_arn, EventKind::OrderCreated, order_data)
    }

    /// Targets an ordered topic: grouped under `payments`, deduplicated per
    /// call.
    pub fn publish_payment_event(
        &self,
        topic_arn: &str,
        payment_data: Value,
    ) -> anyhow::Result<PublishReceipt> {
        self.publish_event(topic_arn, EventKind::PaymentProcessed, payment_data)
    }

    pub fn publish_system_alert(
        &self,
        topic_arn: &str,
        alert_data: Value,
    ) -> anyhow::Result<PublishReceipt> {
        self.publish_event(topic_arn, EventKind::SystemAlert, alert_data)
    }

    #[tracing::instrument(skip(self, data))]
    pub fn publish_event(
        &self,
        topic_arn: &str,
        kind: EventKind,
        data: Value,
    ) -> anyhow::Result<PublishReceipt> {
        let envelope = EventEnvelope::with_clock(kind, data, self.clock);
        let request = build_publish_request(topic_arn, &envelope)
            .context("failed to serialize event envelope")?;

        let message_id = self.topic.publish(&request).inspect_err(|error| {
            tracing::error!(error = ?error, event_type = %kind, "error publishing event");
        })?;

        tracing::info!(
            message_id = %message_id,
            event_id = %envelope.event_id,
            event_type = %kind,
            "event published"
        );

        Ok(PublishReceipt {
            message_id,
            event_id: envelope.event_id,
        })
    }
}
