//! Order Repository Trait

use crate::orders::Order;
use crate::outbox::OutboxRecordInsert;
use crate::shared_kernel::{OrderId, Result};
use async_trait::async_trait;

/// Repository for order persistence.
///
/// `create_with_outbox` is the heart of the transactional outbox: the order
/// row and its outbox record are written in one database transaction, so
/// either both persist or neither does.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically persist an order together with its outbox record.
    ///
    /// # Errors
    /// Returns `DomainError::InfrastructureError` if the transaction fails;
    /// no partial state is left behind.
    async fn create_with_outbox(&self, order: &Order, record: &OutboxRecordInsert) -> Result<()>;

    /// Look up an order by its dedup key.
    async fn find_by_dedup_key(&self, dedup_key: &str) -> Result<Option<Order>>;

    /// Look up an order by id.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>>;
}
