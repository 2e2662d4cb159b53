//! Transactional Outbox Pattern Implementation
//!
//! Domain-level abstractions for the Transactional Outbox Pattern, which
//! solves the dual-write problem between the database and the event bus.

pub mod model;
pub mod repository;

pub use model::{DeliveryOutcome, OutboxError, OutboxRecordInsert, OutboxRecordView};
pub use repository::{OutboxRepository, OutboxRepositoryTx, OutboxStats};
