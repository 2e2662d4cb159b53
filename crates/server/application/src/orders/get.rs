// UC-002: Get Order

use pedidos_server_domain::orders::{Order, OrderRepository};
use pedidos_server_domain::shared_kernel::{OrderId, Result};
use std::sync::Arc;

/// Use Case: Get Order by id (UC-002)
pub struct GetOrderUseCase {
    order_repository: Arc<dyn OrderRepository>,
}

impl GetOrderUseCase {
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    pub async fn execute(&self, order_id: &OrderId) -> Result<Option<Order>> {
        self.order_repository.find_by_id(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pedidos_server_domain::outbox::OutboxRecordInsert;
    use pedidos_server_domain::shared_kernel::UserId;
    use std::sync::Mutex;

    struct SingleOrderRepository {
        order: Mutex<Option<Order>>,
    }

    #[async_trait]
    impl OrderRepository for SingleOrderRepository {
        async fn create_with_outbox(
            &self,
            order: &Order,
            _record: &OutboxRecordInsert,
        ) -> Result<()> {
            *self.order.lock().unwrap() = Some(order.clone());
            Ok(())
        }

        async fn find_by_dedup_key(&self, dedup_key: &str) -> Result<Option<Order>> {
            Ok(self
                .order
                .lock()
                .unwrap()
                .as_ref()
                .filter(|o| o.dedup_key == dedup_key)
                .cloned())
        }

        async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>> {
            Ok(self
                .order
                .lock()
                .unwrap()
                .as_ref()
                .filter(|o| &o.id == id)
                .cloned())
        }
    }

    #[tokio::test]
    async fn test_get_order_round_trip() {
        let order = Order::new(
            OrderId::new(),
            UserId::new(),
            "Book".to_string(),
            1,
            10.0,
            "key".to_string(),
        );
        let repo = Arc::new(SingleOrderRepository {
            order: Mutex::new(Some(order.clone())),
        });
        let use_case = GetOrderUseCase::new(repo);

        let found = use_case.execute(&order.id).await.unwrap();
        assert_eq!(found, Some(order));

        let missing = use_case.execute(&OrderId::new()).await.unwrap();
        assert!(missing.is_none());
    }
}
