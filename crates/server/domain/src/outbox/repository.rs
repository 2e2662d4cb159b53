//! Outbox Repository Trait
//!
//! Abstraction for outbox record persistence operations.

use crate::outbox::{DeliveryOutcome, OutboxError, OutboxRecordInsert, OutboxRecordView};
use async_trait::async_trait;
use sqlx::PgTransaction;
use uuid::Uuid;

/// Repository for outbox record persistence
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Retrieve pending records for publication.
    ///
    /// Records with no publish timestamp and attempts below the ceiling,
    /// ordered by `created_at` ascending, bounded to `limit`. The select is
    /// deliberately not lock-protected: concurrent relay instances may pick
    /// overlapping batches and double-publish, which downstream consumers
    /// must tolerate.
    async fn get_pending(
        &self,
        limit: usize,
        max_attempts: i32,
    ) -> Result<Vec<OutboxRecordView>, OutboxError>;

    /// Persist the outcomes of a dispatched batch in a single transaction.
    ///
    /// Acked records get their publish timestamp; failed records get the
    /// error text. Both increment the attempt counter. If the process dies
    /// before this commit, already-acked records are re-delivered on
    /// restart.
    async fn record_batch_outcomes(&self, outcomes: &[DeliveryOutcome]) -> Result<(), OutboxError>;

    /// Count records still eligible for selection
    async fn count_pending(&self, max_attempts: i32) -> Result<u64, OutboxError>;

    /// Counts by derived status, for monitoring. The only surface on which
    /// exhausted records are visible.
    async fn stats(&self, max_attempts: i32) -> Result<OutboxStats, OutboxError>;

    /// Find a record by its id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<OutboxRecordView>, OutboxError>;
}

/// Outbox Repository with Transaction Support
///
/// Transaction-aware insert for the Transactional Outbox Pattern: call this
/// within the same transaction as the entity persistence.
#[async_trait]
pub trait OutboxRepositoryTx {
    /// Insert a record into the outbox within an existing transaction,
    /// returning the generated record id.
    async fn insert_record_with_tx(
        &self,
        tx: &mut PgTransaction<'_>,
        record: &OutboxRecordInsert,
    ) -> Result<Uuid, OutboxError>;
}

/// Statistics about outbox records
#[derive(Debug, Clone)]
pub struct OutboxStats {
    pub pending_count: u64,
    pub published_count: u64,
    pub exhausted_count: u64,
    pub oldest_pending_age_seconds: Option<i64>,
}

impl OutboxStats {
    pub fn total(&self) -> u64 {
        self.pending_count + self.published_count + self.exhausted_count
    }

    pub fn has_pending(&self) -> bool {
        self.pending_count > 0
    }
}
