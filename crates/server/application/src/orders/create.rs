// Order Use Cases
// UC-001: Create Order

use chrono::Utc;
use pedidos_server_domain::events::OrderCreatedEvent;
use pedidos_server_domain::orders::{CreateOrderRequest, Order, OrderRepository};
use pedidos_server_domain::outbox::OutboxRecordInsert;
use pedidos_server_domain::shared_kernel::{DomainError, OrderId, Result};
use pedidos_server_domain::users::KnownUsersCache;
use pedidos_shared::order_topics;
use std::sync::Arc;

/// Use Case: Create Order (UC-001)
///
/// Idempotent order creation. The known-users precondition is evaluated
/// against the local replica cache, which may lag the user service: a user
/// registered upstream but not yet observed here is rejected. That gap is a
/// deliberate soft check, not a bug to close.
pub struct CreateOrderUseCase {
    order_repository: Arc<dyn OrderRepository>,
    known_users: Arc<KnownUsersCache>,
}

impl CreateOrderUseCase {
    pub fn new(
        order_repository: Arc<dyn OrderRepository>,
        known_users: Arc<KnownUsersCache>,
    ) -> Self {
        Self {
            order_repository,
            known_users,
        }
    }

    /// Execute the creation command.
    ///
    /// Returns the order — freshly created, or the previously stored one
    /// when the dedup key already exists. The caller gets no discriminator
    /// between the two cases, and on a replay any differing attributes in
    /// the request are discarded in favor of the stored row.
    pub async fn execute(&self, request: CreateOrderRequest) -> Result<Order> {
        request.validate()?;

        // Soft precondition, checked before any persistence is attempted
        if !self.known_users.is_known(&request.user_id) {
            tracing::warn!(user_id = %request.user_id, "Rejecting order for unknown user");
            return Err(DomainError::UnknownUser {
                user_id: request.user_id,
            });
        }

        let dedup_key = request.effective_dedup_key();

        if let Some(existing) = self.order_repository.find_by_dedup_key(&dedup_key).await? {
            tracing::info!(
                order_id = %existing.id,
                dedup_key = %dedup_key,
                "Dedup key already processed, returning stored order"
            );
            return Ok(existing);
        }

        let order = Order::new(
            OrderId::new(),
            request.user_id,
            request.product.clone(),
            request.quantity,
            request.price,
            dedup_key,
        );

        // Serialize the event once, now. The relay will ship these exact
        // bytes; the stored order is never re-read to rebuild the payload.
        let event = OrderCreatedEvent {
            id: order.id,
            user_id: order.user_id,
            product: order.product.clone(),
            quantity: order.quantity,
            price: order.price,
            occurred_at: Utc::now(),
        };
        let payload =
            serde_json::to_vec(&event).map_err(|e| DomainError::InfrastructureError {
                message: format!("Failed to serialize OrderCreated event: {}", e),
            })?;
        let record = OutboxRecordInsert::new(order_topics::CREATED, payload);

        // One transaction: order row + outbox record, or neither.
        // Success means the event is durably scheduled, not yet delivered.
        self.order_repository
            .create_with_outbox(&order, &record)
            .await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            "Created order and scheduled OrderCreated event"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pedidos_server_domain::shared_kernel::UserId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockOrderRepository {
        orders: Mutex<Vec<Order>>,
        outbox: Mutex<Vec<OutboxRecordInsert>>,
        fail_writes: bool,
    }

    impl MockOrderRepository {
        fn new() -> Self {
            Self::default()
        }

        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl OrderRepository for MockOrderRepository {
        async fn create_with_outbox(
            &self,
            order: &Order,
            record: &OutboxRecordInsert,
        ) -> Result<()> {
            if self.fail_writes {
                return Err(DomainError::InfrastructureError {
                    message: "database unavailable".to_string(),
                });
            }
            self.orders.lock().unwrap().push(order.clone());
            self.outbox.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find_by_dedup_key(&self, dedup_key: &str) -> Result<Option<Order>> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.dedup_key == dedup_key)
                .cloned())
        }

        async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| &o.id == id)
                .cloned())
        }
    }

    fn known_cache(user_id: UserId) -> Arc<KnownUsersCache> {
        let cache = KnownUsersCache::new();
        cache.observe(user_id);
        Arc::new(cache)
    }

    fn request(user_id: UserId) -> CreateOrderRequest {
        CreateOrderRequest {
            user_id,
            product: "Book".to_string(),
            quantity: 1,
            price: 10.0,
            dedup_key: None,
        }
    }

    #[tokio::test]
    async fn test_create_persists_order_and_outbox_record_together() {
        let user_id = UserId::new();
        let repo = Arc::new(MockOrderRepository::new());
        let use_case = CreateOrderUseCase::new(repo.clone(), known_cache(user_id));

        let order = use_case.execute(request(user_id)).await.unwrap();

        assert_eq!(order.user_id, user_id);
        assert_eq!(repo.orders.lock().unwrap().len(), 1);

        let outbox = repo.outbox.lock().unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].topic, order_topics::CREATED);

        // The captured payload carries the event, camelCase on the wire
        let payload: serde_json::Value = serde_json::from_slice(&outbox[0].payload).unwrap();
        assert_eq!(payload["userId"], user_id.to_string());
        assert_eq!(payload["product"], "Book");
        assert_eq!(payload["quantity"], 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected_before_persistence() {
        let repo = Arc::new(MockOrderRepository::new());
        let use_case = CreateOrderUseCase::new(repo.clone(), Arc::new(KnownUsersCache::new()));

        let result = use_case.execute(request(UserId::new())).await;

        assert!(matches!(result, Err(DomainError::UnknownUser { .. })));
        assert!(repo.orders.lock().unwrap().is_empty());
        assert!(repo.outbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_shape_is_rejected_before_persistence() {
        let user_id = UserId::new();
        let repo = Arc::new(MockOrderRepository::new());
        let use_case = CreateOrderUseCase::new(repo.clone(), known_cache(user_id));

        let mut req = request(user_id);
        req.quantity = 0;
        let result = use_case.execute(req).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(repo.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replay_with_same_derived_key_returns_original() {
        let user_id = UserId::new();
        let repo = Arc::new(MockOrderRepository::new());
        let use_case = CreateOrderUseCase::new(repo.clone(), known_cache(user_id));

        let first = use_case.execute(request(user_id)).await.unwrap();
        let second = use_case.execute(request(user_id)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(
            first.dedup_key,
            format!("{}:Book:1:10.00", user_id)
        );
        // Exactly one row and one scheduled event
        assert_eq!(repo.orders.lock().unwrap().len(), 1);
        assert_eq!(repo.outbox.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replay_discards_differing_attributes() {
        let user_id = UserId::new();
        let repo = Arc::new(MockOrderRepository::new());
        let use_case = CreateOrderUseCase::new(repo.clone(), known_cache(user_id));

        let mut req = request(user_id);
        req.dedup_key = Some("client-key".to_string());
        let first = use_case.execute(req.clone()).await.unwrap();

        // Same key, different attributes: treated as a successful replay,
        // the new attributes are silently ignored
        req.quantity = 99;
        let second = use_case.execute(req).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.quantity, 1);
        assert_eq!(repo.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_key_is_honored() {
        let user_id = UserId::new();
        let repo = Arc::new(MockOrderRepository::new());
        let use_case = CreateOrderUseCase::new(repo.clone(), known_cache(user_id));

        let mut req = request(user_id);
        req.dedup_key = Some("idem-abc".to_string());
        let order = use_case.execute(req).await.unwrap();

        assert_eq!(order.dedup_key, "idem-abc");
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_and_leaves_no_state() {
        let user_id = UserId::new();
        let repo = Arc::new(MockOrderRepository::failing());
        let use_case = CreateOrderUseCase::new(repo.clone(), known_cache(user_id));

        let result = use_case.execute(request(user_id)).await;

        assert!(matches!(
            result,
            Err(DomainError::InfrastructureError { .. })
        ));
        assert!(repo.orders.lock().unwrap().is_empty());
        assert!(repo.outbox.lock().unwrap().is_empty());
    }
}
