//! AWS-oriented adapters and handlers for the event relay.
//!
//! This crate owns runtime integration details (Lambda handlers, the queue
//! dispatch loop, and table/topic/queue adapters). Message contracts live in
//! `event_relay_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
