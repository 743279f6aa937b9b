//! SQLite Config Repository Implementation

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use crate::domain::repositories::ConfigRepository;
use crate::shared::error::RepositoryError;

/// SQLite implementation of ConfigRepository
pub struct SqliteConfigRepository {
    pool: Pool<Sqlite>,
}

impl SqliteConfigRepository {
    /// Creates a new SQLite config repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigRepository for SqliteConfigRepository {
    async fn get(&self, key: &str, default: &str) -> Result<String, RepositoryError> {
        let row = sqlx::query("SELECT config_value FROM config WHERE config_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("config_value")?),
            None => Ok(default.to_string()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR REPLACE INTO config (config_key, config_value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn initialize_defaults(
        &self,
        defaults: &[(&str, &str)],
    ) -> Result<(), RepositoryError> {
        for (key, value) in defaults {
            sqlx::query("INSERT OR IGNORE INTO config (config_key, config_value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}
