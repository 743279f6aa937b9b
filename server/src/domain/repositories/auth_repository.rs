//! AuthRepository trait
//!
//! API tokens, the User-Agent denylist, and single-use OAuth states.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{ApiToken, UaRule};
use crate::shared::error::RepositoryError;

/// Repository for access-control data
#[async_trait]
pub trait AuthRepository: Send + Sync {
    // --- API tokens ---

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, RepositoryError>;

    async fn find_token_by_id(&self, id: i64) -> Result<Option<ApiToken>, RepositoryError>;

    /// Creates a token row; `expires_at = None` means permanent
    async fn create_token(
        &self,
        name: &str,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<i64, RepositoryError>;

    async fn delete_token(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Flips the enabled flag, returning the new value
    async fn toggle_token(&self, id: i64) -> Result<Option<bool>, RepositoryError>;

    /// Resolves a token string to its row iff enabled and unexpired
    async fn validate_token(&self, token: &str) -> Result<Option<ApiToken>, RepositoryError>;

    // --- UA denylist ---

    async fn list_ua_rules(&self) -> Result<Vec<UaRule>, RepositoryError>;

    async fn add_ua_rule(&self, ua_string: &str) -> Result<i64, RepositoryError>;

    async fn delete_ua_rule(&self, id: i64) -> Result<bool, RepositoryError>;

    // --- OAuth states ---

    /// Creates a single-use state bound to a user, valid for ten minutes
    async fn create_oauth_state(&self, user_id: i64) -> Result<String, RepositoryError>;

    /// Consumes a state, returning its user id; a second consumption of the
    /// same state returns None
    async fn consume_oauth_state(&self, state: &str) -> Result<Option<i64>, RepositoryError>;

    /// Removes expired states (periodic sweep)
    async fn clear_expired_oauth_states(&self) -> Result<usize, RepositoryError>;
}
