//! Outbox Relay
//!
//! Background service that reads pending records from the outbox table and
//! publishes them to the event bus. One generic relay, parameterized with
//! its own repository and broker handles at construction; instantiate one
//! per storage context instead of copy-pasting the loop.
//!
//! Delivery is at-least-once: batch outcomes are committed in a single
//! transaction after the whole batch has been dispatched, so a crash between
//! broker acks and that commit re-delivers on restart. Failed records are
//! reselected on the very next poll — there is deliberately no backoff
//! between attempts, only the attempt ceiling.

use pedidos_server_domain::event_bus::EventBus;
use pedidos_server_domain::outbox::{
    DeliveryOutcome, OutboxError, OutboxRecordView, OutboxRepository,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Configuration for the Outbox Relay
#[derive(Debug, Clone)]
pub struct OutboxRelayConfig {
    /// Maximum number of records to process in a single batch
    pub batch_size: usize,
    /// How long to sleep when a poll returns nothing. Also the floor on
    /// publish visibility latency.
    pub poll_interval: Duration,
    /// Attempt ceiling; a record that reaches it is exhausted and never
    /// reselected
    pub max_attempts: i32,
    /// How long to back off after a storage error in the loop itself
    pub error_backoff: Duration,
}

impl Default for OutboxRelayConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            poll_interval: Duration::from_millis(500),
            max_attempts: 5,
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Counters collected by the relay
#[derive(Debug, Default)]
struct OutboxRelayMetrics {
    records_published_total: u64,
    records_failed_total: u64,
    batches_total: u64,
}

/// Snapshot of relay metrics for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRelayMetricsSnapshot {
    pub records_published_total: u64,
    pub records_failed_total: u64,
    pub batches_total: u64,
}

/// Outbox Relay Service
///
/// Runs continuously in a background task; spawn with `tokio::spawn` and
/// stop it with [`OutboxRelay::shutdown`]. Cancellation is cooperative and
/// checked between iterations — an in-flight publish is never interrupted.
pub struct OutboxRelay {
    repository: Arc<dyn OutboxRepository>,
    event_bus: Arc<dyn EventBus>,
    config: OutboxRelayConfig,
    metrics: Mutex<OutboxRelayMetrics>,
    shutdown: tokio::sync::broadcast::Sender<()>,
}

impl OutboxRelay {
    pub fn new(
        repository: Arc<dyn OutboxRepository>,
        event_bus: Arc<dyn EventBus>,
        config: Option<OutboxRelayConfig>,
    ) -> Self {
        let (shutdown, _) = tokio::sync::broadcast::channel(1);
        Self {
            repository,
            event_bus,
            config: config.unwrap_or_default(),
            metrics: Mutex::new(OutboxRelayMetrics::default()),
            shutdown,
        }
    }

    /// Request a cooperative stop. The current batch finishes first.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Thread-safe snapshot of the relay counters
    pub fn metrics_snapshot(&self) -> OutboxRelayMetricsSnapshot {
        let metrics = self.metrics.lock().unwrap();
        OutboxRelayMetricsSnapshot {
            records_published_total: metrics.records_published_total,
            records_failed_total: metrics.records_failed_total,
            batches_total: metrics.batches_total,
        }
    }

    /// Run the relay until shutdown is requested.
    pub async fn run(&self) {
        info!(
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis(),
            max_attempts = self.config.max_attempts,
            "Outbox relay starting"
        );

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            let idle = match self.poll_once().await {
                Ok(processed) => processed == 0,
                Err(e) => {
                    // Storage errors are contained here; the loop keeps going
                    error!("Outbox relay cycle failed: {}", e);
                    tokio::select! {
                        _ = sleep(self.config.error_backoff) => {}
                        _ = shutdown_rx.recv() => break,
                    }
                    continue;
                }
            };

            if idle {
                tokio::select! {
                    _ = sleep(self.config.poll_interval) => {}
                    _ = shutdown_rx.recv() => break,
                }
            } else if shutdown_rx.try_recv().is_ok() {
                break;
            }
        }

        info!("Outbox relay stopped");
    }

    /// Execute one poll cycle: fetch a batch, dispatch every record, persist
    /// the outcomes in one transaction. Returns the number of records
    /// processed.
    pub async fn poll_once(&self) -> Result<usize, OutboxError> {
        let batch = self
            .repository
            .get_pending(self.config.batch_size, self.config.max_attempts)
            .await?;

        if batch.is_empty() {
            debug!("No pending outbox records");
            return Ok(0);
        }

        info!(count = batch.len(), "Processing outbox batch");

        let outcomes = self.dispatch_batch(&batch).await;
        let processed = outcomes.len();

        // If this fails the batch was sent but its outcome not recorded;
        // every record stays pending and is re-dispatched next cycle.
        self.repository.record_batch_outcomes(&outcomes).await?;

        self.metrics.lock().unwrap().batches_total += 1;
        Ok(processed)
    }

    /// Dispatch the records of one batch in creation order. A failed record
    /// never blocks the rest of the batch.
    async fn dispatch_batch(&self, batch: &[OutboxRecordView]) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());

        for record in batch {
            // The stored bytes go out verbatim; partition key is the record
            // id so retries of the same record keep their ordering affinity
            let result = self
                .event_bus
                .publish(&record.topic, &record.id.to_string(), &record.payload)
                .await;

            match result {
                Ok(()) => {
                    debug!(record_id = %record.id, topic = %record.topic, "Outbox record published");
                    self.metrics.lock().unwrap().records_published_total += 1;
                    outcomes.push(DeliveryOutcome::Published {
                        record_id: record.id,
                    });
                }
                Err(e) => {
                    warn!(
                        record_id = %record.id,
                        topic = %record.topic,
                        attempts = record.attempts,
                        error = %e,
                        "Outbox publish failed"
                    );
                    self.metrics.lock().unwrap().records_failed_total += 1;
                    outcomes.push(DeliveryOutcome::Failed {
                        record_id: record.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        outcomes
    }
}
