//! Centralized PostgreSQL Connection Pool Management
//!
//! Single source of truth for pool configuration. The pool is created once
//! in the composition root and a clone of the inner `PgPool` is handed to
//! each repository, so no component resolves connections through a shared
//! container at call time.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Centralized database pool configuration
#[derive(Debug, Clone)]
pub struct DatabasePoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection acquisition timeout
    pub connection_timeout: Duration,
    /// Idle connection lifetime
    pub idle_timeout: Duration,
    /// Maximum connection lifetime
    pub max_lifetime: Duration,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 2,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl DatabasePoolConfig {
    #[inline]
    pub fn new(max_connections: u32, min_connections: u32, connection_timeout_secs: u64) -> Self {
        Self {
            max_connections,
            min_connections,
            connection_timeout: Duration::from_secs(connection_timeout_secs),
            ..Self::default()
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        let max_connections = std::env::var("PEDIDOS_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        let min_connections = std::env::var("PEDIDOS_DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        let connection_timeout_secs = std::env::var("PEDIDOS_DB_CONNECTION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self::new(max_connections, min_connections, connection_timeout_secs)
    }
}

/// Centralized PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new database pool with the given configuration
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created (invalid URL,
    /// database unreachable).
    pub async fn new(url: &str, config: DatabasePoolConfig) -> Result<Self, PoolError> {
        info!(
            "Creating PostgreSQL pool (min={}, max={}, timeout={:?})",
            config.min_connections, config.max_connections, config.connection_timeout
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connection_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(url)
            .await
            .map_err(|e| PoolError::ConnectionFailed(e.to_string()))?;

        info!("PostgreSQL pool created successfully");

        Ok(Self { pool })
    }

    /// Create a pool from environment variables
    ///
    /// Reads `PEDIDOS_DATABASE_URL` or `DATABASE_URL`, plus the
    /// `PEDIDOS_DB_*` tuning variables.
    pub async fn from_env() -> Result<Self, PoolError> {
        let url = std::env::var("PEDIDOS_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| PoolError::MissingUrl)?;

        let config = DatabasePoolConfig::from_env();
        Self::new(&url, config).await
    }

    /// Get the inner `PgPool` for use with sqlx
    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clone the inner `PgPool`
    #[inline]
    pub fn pg_pool(&self) -> PgPool {
        self.pool.clone()
    }
}

/// Errors that can occur when working with the database pool
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Missing database URL in environment")]
    MissingUrl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_defaults() {
        let config = DatabasePoolConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_pool_config_custom() {
        let config = DatabasePoolConfig::new(50, 10, 60);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 10);
        assert_eq!(config.connection_timeout, Duration::from_secs(60));
    }
}
