//! PostgreSQL persistence adapters.

pub mod order_repository;
pub mod pool;

pub use order_repository::PostgresOrderRepository;
pub use pool::{DatabasePool, DatabasePoolConfig, PoolError};
