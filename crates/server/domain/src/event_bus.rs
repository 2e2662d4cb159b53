use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {0}")]
    PublishError(String),
    #[error("Failed to subscribe to topic: {0}")]
    SubscribeError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// A message as received from the broker, payload untouched.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Define la interfaz para el bus de eventos.
///
/// The publish side takes pre-serialized bytes: the outbox relay must ship
/// the payload captured at creation time verbatim, so serialization never
/// happens at publish time. The partition key gives the broker an ordering
/// affinity hint for the message.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publica bytes opacos en un topic, esperando el ack del broker
    async fn publish(
        &self,
        topic: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<(), EventBusError>;

    /// Se suscribe a un topic y devuelve un stream de mensajes crudos
    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<BoxStream<'static, Result<RawMessage, EventBusError>>, EventBusError>;
}

impl From<EventBusError> for crate::shared_kernel::DomainError {
    fn from(err: EventBusError) -> Self {
        crate::shared_kernel::DomainError::InfrastructureError {
            message: err.to_string(),
        }
    }
}
