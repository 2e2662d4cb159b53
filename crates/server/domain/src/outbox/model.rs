//! Outbox Record Model
//!
//! Domain model for outbox records. A record's state is derived from its
//! columns rather than stored: a record with no publish timestamp and
//! attempts below the ceiling is pending; one with a publish timestamp is
//! published (terminal); one that ran out of attempts without an ack is
//! exhausted (terminal, kept for audit, requires operator intervention).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error types for outbox operations
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Infrastructure error: {message}")]
    InfrastructureError { message: String },
}

/// An outbox record ready to be inserted, alongside its entity, in the same
/// transaction. The payload is serialized exactly once, here — later changes
/// to the entity can never desynchronize the published event.
#[derive(Debug, Clone)]
pub struct OutboxRecordInsert {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl OutboxRecordInsert {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// A view of an outbox record from the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecordView {
    pub id: Uuid,
    pub topic: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

impl OutboxRecordView {
    /// Still eligible for relay selection
    pub fn is_pending(&self, max_attempts: i32) -> bool {
        self.published_at.is_none() && self.attempts < max_attempts
    }

    /// Acknowledged by the broker (terminal)
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Ran out of delivery attempts without an ack (terminal)
    pub fn is_exhausted(&self, max_attempts: i32) -> bool {
        self.published_at.is_none() && self.attempts >= max_attempts
    }

    /// Get the age of the record
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.created_at)
    }
}

/// Outcome of one delivery attempt, collected in memory while a batch is
/// dispatched and persisted in a single transaction afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Broker acknowledged; publish timestamp is set and attempts increment
    Published { record_id: Uuid },
    /// Delivery failed; attempts increment and the error text is stored,
    /// leaving the record eligible for the very next poll
    Failed { record_id: Uuid, error: String },
}

impl DeliveryOutcome {
    pub fn record_id(&self) -> Uuid {
        match self {
            DeliveryOutcome::Published { record_id } => *record_id,
            DeliveryOutcome::Failed { record_id, .. } => *record_id,
        }
    }
}
