//! PostgreSQL adapters for the transactional outbox.

pub mod postgres;
pub mod postgres_tx;

pub use postgres::PostgresOutboxRepository;
