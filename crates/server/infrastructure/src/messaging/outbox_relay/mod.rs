//! Outbox relay background service.

pub mod relay;

pub use relay::{OutboxRelay, OutboxRelayConfig, OutboxRelayMetricsSnapshot};
