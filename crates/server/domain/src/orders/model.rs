//! Order aggregate and the creation command.

use crate::shared_kernel::{DomainError, OrderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_PRODUCT_LEN: usize = 200;

/// An order. Immutable once created: this context has no update or delete
/// path, so every field is written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product: String,
    pub quantity: i32,
    pub price: f64,
    /// Unique across all orders; caller-supplied or derived
    pub dedup_key: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        user_id: UserId,
        product: String,
        quantity: i32,
        price: f64,
        dedup_key: String,
    ) -> Self {
        Self {
            id,
            user_id,
            product,
            quantity,
            price,
            dedup_key,
            created_at: Utc::now(),
        }
    }
}

/// Derive the fallback dedup key for a creation request.
///
/// Identical requests must always collapse to the same key, so the format is
/// fixed: `{user_id}:{product}:{quantity}:{price}` with the price always
/// rendered with two decimals (`10.0` -> `"10.00"`).
pub fn derive_dedup_key(user_id: &UserId, product: &str, quantity: i32, price: f64) -> String {
    format!("{}:{}:{}:{:.2}", user_id, product, quantity, price)
}

/// Comando de creación de un pedido
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub product: String,
    pub quantity: i32,
    pub price: f64,
    /// Optional caller-supplied idempotency key
    pub dedup_key: Option<String>,
}

impl CreateOrderRequest {
    /// Validate field shape. Business preconditions (known user) are checked
    /// by the use case, not here.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.product.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "product".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.product.len() > MAX_PRODUCT_LEN {
            return Err(DomainError::Validation {
                field: "product".to_string(),
                reason: format!("must be at most {} characters", MAX_PRODUCT_LEN),
            });
        }
        if self.quantity < 1 {
            return Err(DomainError::Validation {
                field: "quantity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::Validation {
                field: "price".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }

    /// The effective dedup key: the caller's key when present, otherwise the
    /// deterministic fallback.
    pub fn effective_dedup_key(&self) -> String {
        match &self.dedup_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => derive_dedup_key(&self.user_id, &self.product, self.quantity, self.price),
        }
    }
}
