//! Per-kind event handlers and the exhaustive routing between them.

use anyhow::anyhow;
use event_relay_core::contract::{EventKind, ReceivedEnvelope};
use serde_json::Value;

pub trait EventHandler {
    fn handle_order_created(&self, data: &Value) -> anyhow::Result<()>;
    fn handle_payment_processed(&self, data: &Value) -> anyhow::Result<()>;
    fn handle_system_alert(&self, data: &Value) -> anyhow::Result<()>;
}

impl<T: EventHandler + ?Sized> EventHandler for &T {
    fn handle_order_created(&self, data: &Value) -> anyhow::Result<()> {
        (**self).handle_order_created(data)
    }

    fn handle_payment_processed(&self, data: &Value) -> anyhow::Result<()> {
        (**self).handle_payment_processed(data)
    }

    fn handle_system_alert(&self, data: &Value) -> anyhow::Result<()> {
        (**self).handle_system_alert(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Handled(EventKind),
    /// `event_type` absent or outside the known set. Carries the wire value.
    Unrecognized(String),
}

pub fn route_envelope<H: EventHandler + ?Sized>(
    envelope: &ReceivedEnvelope,
    handlers: &H,
) -> anyhow::Result<RouteOutcome> {
    let Some(kind) = envelope.kind() else {
        return Ok(RouteOutcome::Unrecognized(envelope.event_type_label()));
    };

    tracing::info!(event_type = %kind, data = %envelope.data, "processing event");

    match kind {
        EventKind::OrderCreated => handlers.handle_order_created(&envelope.data)?,
        EventKind::PaymentProcessed => handlers.handle_payment_processed(&envelope.data)?,
        EventKind::SystemAlert => handlers.handle_system_alert(&envelope.data)?,
    }

    Ok(RouteOutcome::Handled(kind))
}

/// Handlers that only log. Orders and payments must carry their id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn handle_order_created(&self, data: &Value) -> anyhow::Result<()> {
        let order_id = required_id(data, "order_id", EventKind::OrderCreated)?;
        tracing::info!(order_id = %order_id, "processing new order");
        tracing::info!(order_id = %order_id, "order processed successfully");
        Ok(())
    }

    fn handle_payment_processed(&self, data: &Value) -> anyhow::Result<()> {
        let payment_id = required_id(data, "payment_id", EventKind::PaymentProcessed)?;
        tracing::info!(payment_id = %payment_id, "processing payment");
        tracing::info!(payment_id = %payment_id, "payment processed successfully");
        Ok(())
    }

    fn handle_system_alert(&self, data: &Value) -> anyhow::Result<()> {
        let severity = text_or(data, "severity", "info").to_uppercase();
        let component = text_or(data, "component", "unknown");
        let message = text_or(data, "message", "");
        tracing::info!(
            severity = %severity,
            component = %component,
            "system alert - {severity} in {component}: {message}"
        );
        Ok(())
    }
}

/// Renders an identifier field, rejecting payloads without it.
pub fn required_id(data: &Value, field: &str, kind: EventKind) -> anyhow::Result<String> {
    match data.get(field) {
        None | Some(Value::Null) => Err(anyhow!("{kind} event is missing '{field}'")),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
    }
}

fn text_or<'a>(data: &'a Value, field: &str, default: &'a str) -> &'a str {
    data.get(field).and_then(Value::as_str).unwrap_or(default)
}
