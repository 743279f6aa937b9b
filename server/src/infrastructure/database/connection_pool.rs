//! Database Connection Pool
//!
//! Provides pooling for SQLite with:
//! - Configurable pool size
//! - Connection timeout
//! - WAL journaling for concurrent readers while the task worker writes

use sqlx::{pool::PoolOptions, sqlite::SqliteConnectOptions, Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    /// Database connection string
    pub database_url: String,
    /// Maximum number of connections in pool (default: 10)
    pub max_connections: u32,
    /// Minimum number of connections to maintain (default: 2)
    pub min_connections: u32,
    /// Connection timeout in seconds (default: 30)
    pub connection_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:danmu.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 2,
            connection_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl ConnectionPoolConfig {
    /// Creates a new connection pool configuration
    pub fn new(database_url: String) -> Self {
        Self {
            database_url,
            ..Default::default()
        }
    }

    /// Validates configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.max_connections < self.min_connections {
            return Err(format!(
                "Max connections ({}) must be >= min connections ({})",
                self.max_connections, self.min_connections
            ));
        }
        Ok(())
    }
}

/// Wrapper around the sqlx pool so configuration stays in one place
pub struct ConnectionPool {
    pool: Pool<Sqlite>,
}

impl ConnectionPool {
    /// Creates the pool with SQLite pragmas tuned for a single-writer,
    /// many-reader workload
    pub async fn create(config: ConnectionPoolConfig) -> Result<Self, String> {
        config.validate()?;

        info!(
            "Creating connection pool: max={}, min={}, timeout={}s",
            config.max_connections, config.min_connections, config.connection_timeout_secs
        );

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| format!("Invalid database URL: {}", e))?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("temp_store", "MEMORY")
            .pragma("foreign_keys", "ON");

        let pool = PoolOptions::<Sqlite>::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| format!("Failed to connect: {}", e))?;

        Ok(Self { pool })
    }

    /// The underlying sqlx pool
    pub fn inner(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
