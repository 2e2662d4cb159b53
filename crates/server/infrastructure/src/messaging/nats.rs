//! NATS JetStream EventBus implementation.
//!
//! Durable, at-least-once transport for the outbox relay and the consumers:
//! publishes wait for the JetStream ack, subscriptions are durable pull
//! consumers that survive restarts.
//!
//! Note on acknowledgment ordering: messages are acked as soon as they are
//! pulled, before the subscriber applies them. A crash between ack and apply
//! loses that delivery. This mirrors a continuous auto-commit consumer and
//! is the documented default behavior of this context.

use async_nats::header::HeaderMap;
use async_nats::jetstream::consumer::pull::Config as PullConsumerConfig;
use async_nats::jetstream::consumer::{AckPolicy, DeliverPolicy, PullConsumer};
use async_nats::jetstream::stream::Config as StreamConfig;
use async_nats::jetstream::Context as JetStreamContext;
use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use pedidos_server_domain::event_bus::{EventBus, EventBusError, RawMessage};
use pedidos_shared::STREAM_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Header carrying the partition key of a published message. JetStream has
/// no Kafka-style partitions; the key travels as metadata so downstream
/// tooling can still group by it.
pub const PARTITION_KEY_HEADER: &str = "Pedidos-Partition-Key";

/// NATS connection configuration with production defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URLs
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connection_timeout_secs: u64,
    /// Request timeout in seconds (None = no timeout)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: Option<u64>,
    /// Max reconnection attempts (None = infinite)
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: Option<usize>,
    /// Credentials file path (optional)
    #[serde(default)]
    pub credentials_file: Option<String>,
    /// Client connection name
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            connection_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_reconnects: default_max_reconnects(),
            credentials_file: None,
            name: None,
        }
    }
}

fn default_urls() -> Vec<String> {
    vec!["nats://localhost:4222".to_string()]
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> Option<u64> {
    Some(30)
}

fn default_max_reconnects() -> Option<usize> {
    Some(5)
}

impl NatsConfig {
    /// Defaults for local development
    pub fn for_local() -> Self {
        Self {
            name: Some("pedidos-server".to_string()),
            ..Self::default()
        }
    }

    /// Returns the primary URL for connection
    pub fn primary_url(&self) -> &str {
        self.urls
            .first()
            .map(|s| s.as_str())
            .unwrap_or("nats://localhost:4222")
    }
}

/// NATS EventBus implementation using JetStream.
#[derive(Clone)]
pub struct NatsEventBus {
    client: Arc<Client>,
    jetstream: JetStreamContext,
    stream_prefix: String,
    /// Streams already ensured against the server
    known_streams: Arc<Mutex<HashSet<String>>>,
}

impl NatsEventBus {
    /// Connect to NATS and build the JetStream context.
    ///
    /// # Errors
    /// Returns an error if connection to NATS fails.
    pub async fn new(config: NatsConfig) -> Result<Self, EventBusError> {
        let mut connect_options = ConnectOptions::default()
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs));

        if let Some(timeout_secs) = config.request_timeout_secs {
            connect_options =
                connect_options.request_timeout(Some(Duration::from_secs(timeout_secs)));
        }

        if let Some(name) = &config.name {
            connect_options = connect_options.name(name);
        }

        if let Some(max_reconnects) = config.max_reconnects {
            connect_options = connect_options.max_reconnects(max_reconnects);
        }

        let connect_options = if let Some(creds_file) = &config.credentials_file {
            connect_options
                .credentials_file(creds_file)
                .await
                .map_err(|e| EventBusError::ConnectionError(e.to_string()))?
        } else {
            connect_options
        };

        let client = async_nats::connect_with_options(config.primary_url(), connect_options)
            .await
            .map_err(|e| EventBusError::ConnectionError(e.to_string()))?;

        let jetstream = async_nats::jetstream::new(client.clone());

        Ok(Self {
            client: Arc::new(client),
            jetstream,
            stream_prefix: STREAM_PREFIX.to_string(),
            known_streams: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Override the stream prefix, for isolated/multi-tenant environments.
    pub fn with_prefix(mut self, stream_prefix: &str) -> Self {
        self.stream_prefix = stream_prefix.to_string();
        self
    }

    /// Whether the underlying connection is still alive.
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Stream name for a subject: `pedidos.events.orders.ordercreated`
    /// maps to `PEDIDOS_orders`.
    pub fn stream_name_for_subject(&self, subject: &str) -> String {
        let parts: Vec<&str> = subject.split('.').collect();
        if parts.len() >= 3 {
            format!("{}_{}", self.stream_prefix, parts[2])
        } else {
            format!("{}_events", self.stream_prefix)
        }
    }

    /// Ensure a stream covering `subject` exists on the server.
    async fn ensure_stream(&self, subject: &str) -> Result<(), EventBusError> {
        let stream_name = self.stream_name_for_subject(subject);

        {
            let known = self.known_streams.lock().await;
            if known.contains(&stream_name) {
                return Ok(());
            }
        }

        // The stream may exist from a previous run; capture all subjects of
        // the entity with a wildcard so one stream serves the whole family.
        let entity_wildcard = subject
            .rsplit_once('.')
            .map(|(prefix, _)| format!("{}.>", prefix))
            .unwrap_or_else(|| subject.to_string());

        if self.jetstream.get_stream(&stream_name).await.is_err() {
            info!("Creating stream {} for subject {}", stream_name, subject);

            let stream_config = StreamConfig {
                name: stream_name.clone(),
                subjects: vec![entity_wildcard],
                max_age: Duration::from_secs(24 * 60 * 60),
                max_bytes: 1024 * 1024 * 1024,
                max_messages: 1_000_000,
                storage: async_nats::jetstream::stream::StorageType::File,
                num_replicas: 1,
                discard: async_nats::jetstream::stream::DiscardPolicy::Old,
                ..Default::default()
            };

            self.jetstream
                .create_stream(stream_config)
                .await
                .map_err(|e| EventBusError::ConnectionError(e.to_string()))?;
        } else {
            debug!("Stream {} already exists", stream_name);
        }

        self.known_streams.lock().await.insert(stream_name);
        Ok(())
    }

    /// Get or create a durable pull consumer for a subject.
    async fn get_consumer(
        &self,
        subject: &str,
        consumer_name: &str,
    ) -> Result<PullConsumer, EventBusError> {
        self.ensure_stream(subject).await?;
        let stream_name = self.stream_name_for_subject(subject);

        let stream = self
            .jetstream
            .get_stream(&stream_name)
            .await
            .map_err(|e| EventBusError::ConnectionError(e.to_string()))?;

        let consumer_id = format!("{}-{}", stream_name, consumer_name);

        let consumer_config = PullConsumerConfig {
            durable_name: Some(consumer_id.clone()),
            filter_subject: subject.to_string(),
            deliver_policy: DeliverPolicy::All,
            ack_policy: AckPolicy::Explicit,
            ack_wait: Duration::from_secs(30),
            max_ack_pending: 1000,
            ..Default::default()
        };

        stream
            .get_or_create_consumer(&consumer_id, consumer_config)
            .await
            .map_err(|e| EventBusError::SubscribeError(e.to_string()))
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    /// Publish pre-serialized bytes to a subject, waiting for the JetStream
    /// ack. The payload is shipped verbatim; the partition key travels as a
    /// header.
    async fn publish(
        &self,
        topic: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<(), EventBusError> {
        self.ensure_stream(topic).await?;

        let mut headers = HeaderMap::new();
        headers.insert(PARTITION_KEY_HEADER, partition_key);

        let ack = self
            .jetstream
            .publish_with_headers(topic.to_string(), headers, payload.to_vec().into())
            .await
            .map_err(|e| EventBusError::PublishError(e.to_string()))?;

        // The ack confirms the message was stored by the server
        ack.await
            .map_err(|e| EventBusError::PublishError(e.to_string()))?;

        debug!(topic = topic, partition_key = partition_key, "Published message");

        Ok(())
    }

    /// Subscribe to a topic through a durable pull consumer.
    ///
    /// Messages are acked on receipt, before the caller sees them.
    async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<BoxStream<'static, Result<RawMessage, EventBusError>>, EventBusError> {
        info!("Subscribing to topic: {}", topic);

        let consumer_name = format!("consumer-{}", topic.replace('.', "-"));
        let consumer = self.get_consumer(topic, &consumer_name).await?;

        let stream = async_stream::stream! {
            let mut messages = match consumer.messages().await {
                Ok(msgs) => msgs,
                Err(e) => {
                    error!("Failed to get consumer messages: {}", e);
                    yield Err(EventBusError::ConnectionError(e.to_string()));
                    return;
                }
            };

            while let Some(result) = messages.next().await {
                match result {
                    Ok(message) => {
                        if let Err(ack_err) = message.ack().await {
                            warn!("Failed to ack message: {}", ack_err);
                        }
                        yield Ok(RawMessage {
                            topic: message.subject.to_string(),
                            payload: message.payload.to_vec(),
                        });
                    }
                    Err(e) => {
                        error!("Error receiving message: {}", e);
                        yield Err(EventBusError::ConnectionError(e.to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.urls, vec!["nats://localhost:4222"]);
        assert_eq!(config.connection_timeout_secs, 5);
        assert_eq!(config.request_timeout_secs, Some(30));
        assert_eq!(config.max_reconnects, Some(5));
    }

    #[test]
    fn test_local_config() {
        let config = NatsConfig::for_local();
        assert_eq!(config.name, Some("pedidos-server".to_string()));
    }

    #[test]
    fn test_primary_url() {
        let config = NatsConfig {
            urls: vec![
                "nats://server1:4222".to_string(),
                "nats://server2:4222".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(config.primary_url(), "nats://server1:4222");
    }

    #[tokio::test]
    #[ignore = "Requires NATS"]
    async fn test_publish_round_trips_verbatim() {
        let bus = NatsEventBus::new(NatsConfig::for_local())
            .await
            .unwrap()
            .with_prefix(&format!("PEDIDOS_TEST_{}", uuid::Uuid::new_v4().simple()));

        let topic = "pedidos.events.orders.ordercreated";
        let payload = br#"{"product":"Book","quantity":1}"#;
        bus.publish(topic, "record-1", payload).await.unwrap();

        let mut stream = bus.subscribe(topic).await.unwrap();
        let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for message")
            .unwrap()
            .unwrap();

        assert_eq!(message.payload, payload.to_vec());
        assert_eq!(message.topic, topic);
    }
}
