//! CacheRepository trait
//!
//! Keyed, TTL-bounded, provider-tagged blob cache. Values are opaque JSON
//! text; callers re-validate against their own models and treat a stale
//! shape as a miss.

use async_trait::async_trait;

use crate::shared::error::RepositoryError;

/// Repository for cache data access
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Gets a value; entries at or past their expiry are invisible
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    /// Upserts a value with a TTL in seconds and an owning provider tag.
    /// A TTL of zero or less disables caching: the write is a no-op.
    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: i64,
        provider: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Deletes one key
    async fn delete(&self, key: &str) -> Result<bool, RepositoryError>;

    /// Clears every entry, returning how many were removed
    async fn clear_all(&self) -> Result<usize, RepositoryError>;

    /// Removes expired entries (the hourly sweep)
    async fn clear_expired(&self) -> Result<usize, RepositoryError>;
}
