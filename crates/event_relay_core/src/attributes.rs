use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

use crate::contract::{EventEnvelope, EventKind};

pub const PAYMENT_MESSAGE_GROUP: &str = "payments";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAttribute {
    String(String),
    Number(String),
}

impl MessageAttribute {
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Number(_) => "Number",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::String(value) | Self::Number(value) => value,
        }
    }
}

pub type MessageAttributes = BTreeMap<String, MessageAttribute>;

/// Everything needed for a single topic publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub topic_arn: String,
    pub message: String,
    pub subject: Option<String>,
    pub attributes: MessageAttributes,
    pub group_id: Option<String>,
    pub deduplication_id: Option<String>,
}

pub fn build_publish_request(
    topic_arn: &str,
    envelope: &EventEnvelope,
) -> Result<PublishRequest, serde_json::Error> {
    let kind = envelope.event_type;
    let message = serde_json::to_string(envelope)?;

    let (group_id, deduplication_id) = match kind {
        EventKind::PaymentProcessed => (
            Some(PAYMENT_MESSAGE_GROUP.to_string()),
            Some(Uuid::new_v4().to_string()),
        ),
        EventKind::OrderCreated | EventKind::SystemAlert => (None, None),
    };

    let subject = match kind {
        EventKind::SystemAlert => Some(format!(
            "System Alert: {}",
            string_field(&envelope.data, "severity").unwrap_or("unknown")
        )),
        EventKind::OrderCreated | EventKind::PaymentProcessed => None,
    };

    Ok(PublishRequest {
        topic_arn: topic_arn.to_string(),
        message,
        subject,
        attributes: routing_attributes(kind, &envelope.data),
        group_id,
        deduplication_id,
    })
}

pub fn routing_attributes(kind: EventKind, data: &Value) -> MessageAttributes {
    let mut attributes = MessageAttributes::new();
    attributes.insert(
        "event_type".to_string(),
        MessageAttribute::String(kind.as_str().to_string()),
    );

    match kind {
        EventKind::OrderCreated => {
            insert_string(&mut attributes, data, "priority", "medium");
            insert_string(&mut attributes, data, "customer_tier", "standard");
        }
        EventKind::PaymentProcessed => {
            attributes.insert(
                "amount".to_string(),
                MessageAttribute::Number(number_field(data, "amount")),
            );
        }
        EventKind::SystemAlert => {
            insert_string(&mut attributes, data, "severity", "info");
            insert_string(&mut attributes, data, "component", "unknown");
        }
    }

    attributes
}

fn insert_string(attributes: &mut MessageAttributes, data: &Value, field: &str, default: &str) {
    let value = string_field(data, field).unwrap_or(default).to_string();
    attributes.insert(field.to_string(), MessageAttribute::String(value));
}

fn string_field<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(Value::as_str)
}

fn number_field(data: &Value, field: &str) -> String {
    match data.get(field) {
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) if text.trim().parse::<f64>().is_ok() => text.trim().to_string(),
        _ => "0".to_string(),
    }
}
