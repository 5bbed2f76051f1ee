//! Shared event relay domain primitives.
//!
//! This crate owns the message contracts the relay components agree on:
//! the event envelope, routing attributes, notification unwrapping and
//! storage-event row shaping. It intentionally excludes AWS SDK and Lambda
//! runtime concerns.

pub mod attributes;
pub mod contract;
pub mod notification;
pub mod storage_event;
