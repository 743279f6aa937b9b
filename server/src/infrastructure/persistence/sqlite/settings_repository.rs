//! SQLite Settings Repository Implementation
//!
//! Discovery-time sync of scrapers and metadata sources. Operator flags
//! survive restarts; new providers land at the end of the display order.

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use tracing::warn;

use crate::domain::entities::{MetadataSourceSetting, ScraperSetting};
use crate::domain::repositories::SettingsRepository;
use crate::shared::error::RepositoryError;

/// SQLite implementation of SettingsRepository
pub struct SqliteSettingsRepository {
    pool: Pool<Sqlite>,
}

impl SqliteSettingsRepository {
    /// Creates a new SQLite settings repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn sync_scrapers(&self, discovered: &[&str]) -> Result<(), RepositoryError> {
        if discovered.is_empty() {
            // Refuse to prune when discovery came back empty; this smells
            // like a broken build rather than an intentional removal
            warn!("scraper discovery returned nothing; keeping existing rows");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT COALESCE(MAX(display_order), 0) AS max_order FROM scrapers")
            .fetch_one(&mut *tx)
            .await?;
        let mut next_order: i32 = row.try_get::<i32, _>("max_order")? + 1;

        for provider in discovered {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO scrapers (provider_name, is_enabled, display_order, use_proxy) \
                 VALUES (?, 1, ?, 0)",
            )
            .bind(provider)
            .bind(next_order)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                next_order += 1;
            }
        }

        let placeholders = vec!["?"; discovered.len()].join(", ");
        let sql = format!("DELETE FROM scrapers WHERE provider_name NOT IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for provider in discovered {
            query = query.bind(provider);
        }
        query.execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn all_scraper_settings(&self) -> Result<Vec<ScraperSetting>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM scrapers ORDER BY display_order ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ScraperSetting {
                    provider_name: row.try_get("provider_name")?,
                    is_enabled: row.try_get("is_enabled")?,
                    display_order: row.try_get("display_order")?,
                    use_proxy: row.try_get("use_proxy")?,
                })
            })
            .collect()
    }

    async fn scraper_setting(
        &self,
        provider_name: &str,
    ) -> Result<Option<ScraperSetting>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM scrapers WHERE provider_name = ?")
            .bind(provider_name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            Ok(ScraperSetting {
                provider_name: row.try_get("provider_name")?,
                is_enabled: row.try_get("is_enabled")?,
                display_order: row.try_get("display_order")?,
                use_proxy: row.try_get("use_proxy")?,
            })
        })
        .transpose()
    }

    async fn update_scraper_settings(
        &self,
        settings: &[ScraperSetting],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for setting in settings {
            sqlx::query(
                "UPDATE scrapers SET is_enabled = ?, display_order = ?, use_proxy = ? \
                 WHERE provider_name = ?",
            )
            .bind(setting.is_enabled)
            .bind(setting.display_order)
            .bind(setting.use_proxy)
            .bind(&setting.provider_name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn sync_metadata_sources(&self, discovered: &[&str]) -> Result<(), RepositoryError> {
        if discovered.is_empty() {
            warn!("metadata source discovery returned nothing; keeping existing rows");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(display_order), 0) AS max_order FROM metadata_sources",
        )
        .fetch_one(&mut *tx)
        .await?;
        let mut next_order: i32 = row.try_get::<i32, _>("max_order")? + 1;

        for provider in discovered {
            // tmdb ships with aux search on; it is forced on either way
            let aux_default = *provider == "tmdb";
            let result = sqlx::query(
                "INSERT OR IGNORE INTO metadata_sources \
                 (provider_name, is_enabled, is_aux_search_enabled, display_order, use_proxy) \
                 VALUES (?, 1, ?, ?, 0)",
            )
            .bind(provider)
            .bind(aux_default)
            .bind(next_order)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() > 0 {
                next_order += 1;
            }
        }

        let placeholders = vec!["?"; discovered.len()].join(", ");
        let sql =
            format!("DELETE FROM metadata_sources WHERE provider_name NOT IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for provider in discovered {
            query = query.bind(provider);
        }
        query.execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn all_metadata_settings(
        &self,
    ) -> Result<Vec<MetadataSourceSetting>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM metadata_sources ORDER BY display_order ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(MetadataSourceSetting {
                    provider_name: row.try_get("provider_name")?,
                    is_enabled: row.try_get("is_enabled")?,
                    is_aux_search_enabled: row.try_get("is_aux_search_enabled")?,
                    display_order: row.try_get("display_order")?,
                    use_proxy: row.try_get("use_proxy")?,
                })
            })
            .collect()
    }

    async fn update_metadata_settings(
        &self,
        settings: &[MetadataSourceSetting],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for setting in settings {
            // Invariant: tmdb's aux search cannot be turned off while the
            // source itself is enabled
            let aux = if setting.provider_name == "tmdb" && setting.is_enabled {
                true
            } else {
                setting.is_aux_search_enabled
            };
            sqlx::query(
                "UPDATE metadata_sources SET is_enabled = ?, is_aux_search_enabled = ?, \
                 display_order = ?, use_proxy = ? WHERE provider_name = ?",
            )
            .bind(setting.is_enabled)
            .bind(aux)
            .bind(setting.display_order)
            .bind(setting.use_proxy)
            .bind(&setting.provider_name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
