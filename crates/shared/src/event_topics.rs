//! Centralized event topic constants for NATS JetStream
//!
//! Single source of truth for all event subject names, preventing
//! mismatches between the outbox producer and the consumers.
//!
//! ## Naming Convention
//! - Format: `pedidos.events.{entity}.{action}`
//! - entity: The domain entity (orders, users)
//! - action: The event type in lowercase (ordercreated, userregistered)

/// Subject prefix for all events of this platform
pub const EVENT_PREFIX: &str = "pedidos.events";

/// Stream name prefix for JetStream streams
pub const STREAM_PREFIX: &str = "PEDIDOS";

/// Order-related event topics
pub mod order_topics {
    /// OrderCreated event subject (written by the command handler, relayed by the outbox)
    pub const CREATED: &str = "pedidos.events.orders.ordercreated";

    /// Wildcard for all order events
    pub const ALL: &str = "pedidos.events.orders.>";
}

/// User-related event topics (produced by the external user-registration context)
pub mod user_topics {
    /// UserRegistered event subject
    pub const REGISTERED: &str = "pedidos.events.users.userregistered";

    /// Wildcard for all user events
    pub const ALL: &str = "pedidos.events.users.>";
}
