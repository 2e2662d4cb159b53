// Pedidos Order Context - Infrastructure Layer
// Adapters for the ports declared in the domain:
// - persistence: PostgreSQL repositories (orders, outbox) and pool
// - messaging: NATS JetStream event bus, outbox relay, consumers

pub mod messaging;
pub mod persistence;
