//! Messaging adapters: NATS JetStream event bus, the outbox relay and the
//! user-registration consumer.

pub mod nats;
pub mod outbox_relay;
pub mod user_registered_consumer;

pub use nats::{NatsConfig, NatsEventBus};
pub use outbox_relay::{OutboxRelay, OutboxRelayConfig};
pub use user_registered_consumer::{UserRegisteredConsumer, UserRegisteredConsumerConfig};
