pub use pedidos_shared::*;

/// Errores del dominio
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("Invalid field {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Unknown user: {user_id}")]
    UnknownUser { user_id: UserId },

    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    #[error("Infrastructure error: {message}")]
    InfrastructureError { message: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;

impl DomainError {
    /// True when the error is a synchronous request rejection rather than
    /// a storage/broker failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DomainError::Validation { .. } | DomainError::UnknownUser { .. }
        )
    }
}
