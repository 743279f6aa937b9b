//! ConfigRepository trait
//!
//! Persisted key/value configuration. Values are stored as strings and
//! interpreted by callers (bool-as-string, int-as-string).

use async_trait::async_trait;

use crate::shared::error::RepositoryError;

/// Repository for persisted configuration
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Gets a value, falling back to the given default when unset
    async fn get(&self, key: &str, default: &str) -> Result<String, RepositoryError>;

    /// Upserts a value
    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError>;

    /// Inserts defaults for any keys not yet present
    async fn initialize_defaults(
        &self,
        defaults: &[(&str, &str)],
    ) -> Result<(), RepositoryError>;
}
