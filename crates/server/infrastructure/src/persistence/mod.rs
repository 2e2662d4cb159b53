pub mod outbox;
pub mod postgres;

pub use outbox::PostgresOutboxRepository;
pub use postgres::order_repository::PostgresOrderRepository;
pub use postgres::pool::{DatabasePool, DatabasePoolConfig, PoolError};
