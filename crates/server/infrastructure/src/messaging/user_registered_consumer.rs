//! UserRegistered Consumer
//!
//! Background service that subscribes to the user-registration topic and
//! feeds the known-users cache. Applying an event is `observe(id)`, which is
//! idempotent, so redeliveries are harmless.
//!
//! Malformed payloads are logged and dropped — there is no dead-letter sink
//! in this context; detecting drops requires log monitoring.

use futures::StreamExt;
use pedidos_server_domain::event_bus::EventBus;
use pedidos_server_domain::events::{decode_event, UserRegisteredEvent};
use pedidos_server_domain::users::KnownUsersCache;
use pedidos_shared::user_topics;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Configuration for the UserRegistered consumer
#[derive(Debug, Clone)]
pub struct UserRegisteredConsumerConfig {
    /// The single topic this consumer subscribes to
    pub topic: String,
    /// Delay before resubscribing after a broker failure
    pub reconnect_delay: Duration,
}

impl Default for UserRegisteredConsumerConfig {
    fn default() -> Self {
        Self {
            topic: user_topics::REGISTERED.to_string(),
            reconnect_delay: Duration::from_millis(500),
        }
    }
}

/// Consumes `UserRegistered` events and records each user in the cache.
pub struct UserRegisteredConsumer {
    event_bus: Arc<dyn EventBus>,
    cache: Arc<KnownUsersCache>,
    config: UserRegisteredConsumerConfig,
    shutdown: tokio::sync::broadcast::Sender<()>,
}

impl UserRegisteredConsumer {
    pub fn new(
        event_bus: Arc<dyn EventBus>,
        cache: Arc<KnownUsersCache>,
        config: Option<UserRegisteredConsumerConfig>,
    ) -> Self {
        let (shutdown, _) = tokio::sync::broadcast::channel(1);
        Self {
            event_bus,
            cache,
            config: config.unwrap_or_default(),
            shutdown,
        }
    }

    /// Request a cooperative stop, honored between messages.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Run until shutdown: subscribe, consume, resubscribe on broker errors.
    pub async fn run(&self) {
        info!(topic = %self.config.topic, "UserRegistered consumer starting");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            let mut stream = match self.event_bus.subscribe(&self.config.topic).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Broker unavailable, retrying subscribe: {}", e);
                    tokio::select! {
                        _ = sleep(self.config.reconnect_delay) => continue,
                        _ = shutdown_rx.recv() => break,
                    }
                }
            };

            loop {
                tokio::select! {
                    next = stream.next() => match next {
                        Some(Ok(message)) => self.apply_payload(&message.payload),
                        Some(Err(e)) => {
                            warn!("Broker stream error: {}", e);
                            sleep(self.config.reconnect_delay).await;
                            break;
                        }
                        None => {
                            warn!("Broker stream ended, resubscribing");
                            sleep(self.config.reconnect_delay).await;
                            break;
                        }
                    },
                    _ = shutdown_rx.recv() => {
                        info!("UserRegistered consumer shutting down");
                        return;
                    }
                }
            }
        }

        info!("UserRegistered consumer stopped");
    }

    /// Decode one payload and apply its effect to the cache. Decode failures
    /// drop the message and keep the loop alive.
    fn apply_payload(&self, payload: &[u8]) {
        match decode_event::<UserRegisteredEvent>(payload) {
            Ok(event) => {
                self.cache.observe(event.id);
                info!(user_id = %event.id, "Observed registered user");
            }
            Err(e) => {
                error!(
                    error = %e,
                    payload_len = payload.len(),
                    "Dropping undecodable user-registration message"
                );
            }
        }
    }
}
