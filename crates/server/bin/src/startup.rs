//! Startup wiring: pool, migrations, broker connection, background loops.

use crate::config::ServerConfig;
use anyhow::Context;
use pedidos_server_application::orders::{CreateOrderUseCase, GetOrderUseCase};
use pedidos_server_domain::event_bus::EventBus;
use pedidos_server_domain::outbox::OutboxRepository;
use pedidos_server_domain::users::KnownUsersCache;
use pedidos_server_infrastructure::messaging::{
    NatsConfig, NatsEventBus, OutboxRelay, OutboxRelayConfig, UserRegisteredConsumer,
};
use pedidos_server_infrastructure::persistence::{
    DatabasePool, DatabasePoolConfig, PostgresOrderRepository, PostgresOutboxRepository,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Handles to the wired application, returned to the embedding process.
///
/// The use cases are the command surface an outer transport calls into;
/// the background loops are already running.
pub struct Services {
    pub create_order: Arc<CreateOrderUseCase>,
    pub get_order: Arc<GetOrderUseCase>,
    pub known_users: Arc<KnownUsersCache>,
    relay: Arc<OutboxRelay>,
    consumer: Arc<UserRegisteredConsumer>,
}

impl Services {
    /// Request a cooperative stop of the background loops.
    pub fn shutdown(&self) {
        self.relay.shutdown();
        self.consumer.shutdown();
    }
}

pub async fn run(config: ServerConfig) -> anyhow::Result<Services> {
    // Storage: one pool, cloned into each repository
    let pool = match &config.database_url {
        Some(url) => DatabasePool::new(url, DatabasePoolConfig::from_env()).await?,
        None => DatabasePool::from_env()
            .await
            .context("No database URL configured (set PEDIDOS_DATABASE_URL)")?,
    };

    let order_repository = PostgresOrderRepository::new(pool.pg_pool());
    let outbox_repository = PostgresOutboxRepository::new(pool.pg_pool());
    order_repository.run_migrations().await?;
    outbox_repository.run_migrations().await?;

    // Broker: each background loop gets its own clone of the bus handle
    let nats_config = NatsConfig {
        urls: vec![config.nats_url.clone()],
        name: Some("pedidos-server".to_string()),
        ..NatsConfig::default()
    };
    let event_bus = Arc::new(
        NatsEventBus::new(nats_config)
            .await
            .context("Failed to connect to NATS")?,
    );

    let known_users = Arc::new(KnownUsersCache::new());

    // Background loop: outbox relay (one instance for this storage context)
    let relay = Arc::new(OutboxRelay::new(
        Arc::new(outbox_repository) as Arc<dyn OutboxRepository>,
        event_bus.clone() as Arc<dyn EventBus>,
        Some(OutboxRelayConfig {
            batch_size: config.outbox_batch_size,
            poll_interval: Duration::from_millis(config.outbox_poll_interval_ms),
            max_attempts: config.outbox_max_attempts,
            ..OutboxRelayConfig::default()
        }),
    ));
    {
        let relay = relay.clone();
        tokio::spawn(async move { relay.run().await });
    }

    // Background loop: user-registration consumer feeding the cache
    let consumer = Arc::new(UserRegisteredConsumer::new(
        event_bus.clone() as Arc<dyn EventBus>,
        known_users.clone(),
        None,
    ));
    {
        let consumer = consumer.clone();
        tokio::spawn(async move { consumer.run().await });
    }

    let order_repository = Arc::new(order_repository);
    let create_order = Arc::new(CreateOrderUseCase::new(
        order_repository.clone(),
        known_users.clone(),
    ));
    let get_order = Arc::new(GetOrderUseCase::new(order_repository));

    info!("Pedidos server wired: relay and consumer running");

    Ok(Services {
        create_order,
        get_order,
        known_users,
        relay,
        consumer,
    })
}
