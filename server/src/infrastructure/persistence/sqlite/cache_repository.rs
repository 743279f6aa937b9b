//! SQLite Cache Repository Implementation
//!
//! Provides the SQLite-backed implementation of the CacheRepository trait.
//! Stale rows stay invisible to readers until the hourly sweep removes them.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{Pool, Row, Sqlite};

use crate::domain::repositories::CacheRepository;
use crate::shared::error::RepositoryError;

/// SQLite implementation of CacheRepository
pub struct SqliteCacheRepository {
    pool: Pool<Sqlite>,
}

impl SqliteCacheRepository {
    /// Creates a new SQLite cache repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheRepository for SqliteCacheRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query(
            "SELECT cache_value FROM cache WHERE cache_key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("cache_value")?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: i64,
        provider: Option<&str>,
    ) -> Result<(), RepositoryError> {
        // A non-positive TTL disables caching for this operation
        if ttl_seconds <= 0 {
            return Ok(());
        }

        let expires_at = Utc::now() + Duration::seconds(ttl_seconds);
        sqlx::query(
            "INSERT OR REPLACE INTO cache (cache_key, cache_provider, cache_value, expires_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(key)
        .bind(provider)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cache WHERE cache_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_all(&self) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM cache").execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }

    async fn clear_expired(&self) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM cache WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}
