//! Unwrapping of topic notifications delivered through a queue.
//!
//! A queue message body is an SNS notification document whose `Message`
//! field holds the serialized [`EventEnvelope`](crate::contract::EventEnvelope).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::ReceivedEnvelope;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("message has no body")]
    MissingBody,

    #[error("malformed notification: {0}")]
    MalformedNotification(#[source] serde_json::Error),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
}

/// The subset of the SNS notification document the relay reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicNotification {
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    #[serde(rename = "MessageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "TopicArn", default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
    #[serde(rename = "Subject", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "Message")]
    pub message: String,
}

impl TopicNotification {
    /// Wraps a serialized envelope the way the topic does when fanning out to
    /// a queue subscription without raw delivery.
    pub fn wrap(
        message_id: impl Into<String>,
        topic_arn: impl Into<String>,
        message: String,
    ) -> Self {
        Self {
            notification_type: Some("Notification".to_string()),
            message_id: Some(message_id.into()),
            topic_arn: Some(topic_arn.into()),
            subject: None,
            message,
        }
    }
}

pub fn decode_envelope(message: &str) -> Result<ReceivedEnvelope, EnvelopeError> {
    serde_json::from_str(message).map_err(EnvelopeError::MalformedEnvelope)
}

/// Queue body -> notification -> envelope.
pub fn unwrap_queue_body(body: Option<&str>) -> Result<ReceivedEnvelope, EnvelopeError> {
    let body = body.ok_or(EnvelopeError::MissingBody)?;
    let notification: TopicNotification =
        serde_json::from_str(body).map_err(EnvelopeError::MalformedNotification)?;
    decode_envelope(&notification.message)
}
