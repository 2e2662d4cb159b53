//! Event contracts produced and consumed by this context.
//!
//! `OrderCreatedEvent` is serialized exactly once, when the command handler
//! writes the outbox record; the relay publishes those bytes verbatim.
//! `UserRegisteredEvent` is produced by the external user-registration
//! service; historical payloads use PascalCase field names and are sometimes
//! double-encoded (a JSON string literal wrapping the document), so decoding
//! tolerates both.

use crate::shared_kernel::{OrderId, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Event emitted when an order has been created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    pub id: OrderId,
    pub user_id: UserId,
    pub product: String,
    pub quantity: i32,
    pub price: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event consumed from the user-registration context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisteredEvent {
    #[serde(alias = "Id")]
    pub id: UserId,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "OccurredAtUtc", alias = "occurredAtUtc")]
    pub occurred_at: DateTime<Utc>,
}

/// Decode an event payload, unwrapping one level of double-encoding.
///
/// If the payload is itself a JSON string literal (`"\"{...}\""`), the inner
/// string is parsed as the actual document. Only one level is unwrapped.
pub fn decode_event<T: DeserializeOwned>(raw: &[u8]) -> Result<T, serde_json::Error> {
    let first = raw.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'"') {
        let inner: String = serde_json::from_slice(raw)?;
        serde_json::from_str(&inner)
    } else {
        serde_json::from_slice(raw)
    }
}
