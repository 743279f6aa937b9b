//! SQLite Auth Repository Implementation
//!
//! API tokens, the UA denylist, and single-use OAuth states.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::domain::entities::{ApiToken, UaRule};
use crate::domain::repositories::AuthRepository;
use crate::shared::error::RepositoryError;

/// OAuth states are short-lived by design
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

fn map_token(row: &sqlx::sqlite::SqliteRow) -> Result<ApiToken, RepositoryError> {
    Ok(ApiToken {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        token: row.try_get("token")?,
        is_enabled: row.try_get("is_enabled")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// SQLite implementation of AuthRepository
pub struct SqliteAuthRepository {
    pool: Pool<Sqlite>,
}

impl SqliteAuthRepository {
    /// Creates a new SQLite auth repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthRepository for SqliteAuthRepository {
    async fn list_tokens(&self) -> Result<Vec<ApiToken>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM api_tokens ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_token).collect()
    }

    async fn find_token_by_id(&self, id: i64) -> Result<Option<ApiToken>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM api_tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_token).transpose()
    }

    async fn create_token(
        &self,
        name: &str,
        token: &str,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO api_tokens (name, token, is_enabled, expires_at, created_at) \
             VALUES (?, ?, 1, ?, ?)",
        )
        .bind(name)
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn delete_token(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_token(&self, id: i64) -> Result<Option<bool>, RepositoryError> {
        let Some(token) = self.find_token_by_id(id).await? else {
            return Ok(None);
        };
        let target = !token.is_enabled;
        sqlx::query("UPDATE api_tokens SET is_enabled = ? WHERE id = ?")
            .bind(target)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(Some(target))
    }

    async fn validate_token(&self, token: &str) -> Result<Option<ApiToken>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM api_tokens WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(api_token) = row.as_ref().map(map_token).transpose()? else {
            return Ok(None);
        };
        if api_token.is_valid_at(Utc::now()) {
            Ok(Some(api_token))
        } else {
            Ok(None)
        }
    }

    async fn list_ua_rules(&self) -> Result<Vec<UaRule>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM ua_rules ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(UaRule {
                    id: row.try_get("id")?,
                    ua_string: row.try_get("ua_string")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn add_ua_rule(&self, ua_string: &str) -> Result<i64, RepositoryError> {
        let result = sqlx::query("INSERT INTO ua_rules (ua_string, created_at) VALUES (?, ?)")
            .bind(ua_string)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn delete_ua_rule(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM ua_rules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_oauth_state(&self, user_id: i64) -> Result<String, RepositoryError> {
        let state = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::minutes(OAUTH_STATE_TTL_MINUTES);
        sqlx::query("INSERT INTO oauth_states (state_key, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&state)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(state)
    }

    async fn consume_oauth_state(&self, state: &str) -> Result<Option<i64>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT user_id, expires_at FROM oauth_states WHERE state_key = ?")
            .bind(state)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        // Single-use: the row disappears whether or not it was still fresh
        sqlx::query("DELETE FROM oauth_states WHERE state_key = ?")
            .bind(state)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: chrono::DateTime<Utc> = row.try_get("expires_at")?;
        if expires_at > Utc::now() {
            Ok(Some(user_id))
        } else {
            Ok(None)
        }
    }

    async fn clear_expired_oauth_states(&self) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}
