//! SQLite Source Repository Implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::domain::entities::Source;
use crate::domain::repositories::{SourceDetails, SourceRepository};
use crate::domain::value_objects::WorkType;
use crate::shared::error::{DomainError, RepositoryError};

fn map_source(row: &sqlx::sqlite::SqliteRow) -> Result<Source, RepositoryError> {
    Ok(Source {
        id: row.try_get("id")?,
        anime_id: row.try_get("anime_id")?,
        provider_name: row.try_get("provider_name")?,
        media_id: row.try_get("media_id")?,
        is_favorited: row.try_get("is_favorited")?,
        incremental_refresh_enabled: row.try_get("incremental_refresh_enabled")?,
        incremental_refresh_failures: row.try_get("incremental_refresh_failures")?,
        created_at: row.try_get("created_at")?,
    })
}

/// SQLite implementation of SourceRepository
pub struct SqliteSourceRepository {
    pool: Pool<Sqlite>,
}

impl SqliteSourceRepository {
    /// Creates a new SQLite source repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepository for SqliteSourceRepository {
    async fn link(
        &self,
        anime_id: i64,
        provider_name: &str,
        media_id: &str,
    ) -> Result<i64, RepositoryError> {
        sqlx::query(
            "INSERT OR IGNORE INTO anime_sources (anime_id, provider_name, media_id, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(anime_id)
        .bind(provider_name)
        .bind(media_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id FROM anime_sources WHERE anime_id = ? AND provider_name = ? AND media_id = ?",
        )
        .bind(anime_id)
        .bind(provider_name)
        .bind(media_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id")?)
    }

    async fn find_by_id(&self, source_id: i64) -> Result<Option<Source>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM anime_sources WHERE id = ?")
            .bind(source_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_source).transpose()
    }

    async fn details(&self, source_id: i64) -> Result<Option<SourceDetails>, RepositoryError> {
        let row = sqlx::query(
            "SELECT s.id AS source_id, s.anime_id, s.provider_name, s.media_id, \
             a.title, a.type, a.season, m.tmdb_id \
             FROM anime_sources s \
             JOIN anime a ON s.anime_id = a.id \
             LEFT JOIN anime_metadata m ON a.id = m.anime_id \
             WHERE s.id = ?",
        )
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let type_str: String = row.try_get("type")?;
            Ok(SourceDetails {
                source_id: row.try_get("source_id")?,
                anime_id: row.try_get("anime_id")?,
                provider_name: row.try_get("provider_name")?,
                media_id: row.try_get("media_id")?,
                title: row.try_get("title")?,
                work_type: WorkType::from_str(&type_str).map_err(RepositoryError::Domain)?,
                season: row.try_get("season")?,
                tmdb_id: row.try_get("tmdb_id")?,
            })
        })
        .transpose()
    }

    async fn list_for_anime(&self, anime_id: i64) -> Result<Vec<Source>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM anime_sources WHERE anime_id = ? ORDER BY id ASC")
            .bind(anime_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_source).collect()
    }

    async fn source_order(&self, anime_id: i64, source_id: i64) -> Result<i64, RepositoryError> {
        let rows = sqlx::query("SELECT id FROM anime_sources WHERE anime_id = ? ORDER BY id ASC")
            .bind(anime_id)
            .fetch_all(&self.pool)
            .await?;

        for (idx, row) in rows.iter().enumerate() {
            let id: i64 = row.try_get("id")?;
            if id == source_id {
                return Ok(idx as i64 + 1);
            }
        }
        Err(RepositoryError::Domain(DomainError::InvariantViolation(
            format!("source {source_id} does not belong to anime {anime_id}"),
        )))
    }

    async fn toggle_favorite(&self, source_id: i64) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT anime_id, is_favorited FROM anime_sources WHERE id = ?")
            .bind(source_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("source {source_id}")))?;
        let anime_id: i64 = row.try_get("anime_id")?;
        let currently: bool = row.try_get("is_favorited")?;
        let target = !currently;

        if target {
            // At most one favorite per anime: clear the siblings first
            sqlx::query("UPDATE anime_sources SET is_favorited = 0 WHERE anime_id = ?")
                .bind(anime_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("UPDATE anime_sources SET is_favorited = ? WHERE id = ?")
            .bind(target)
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(target)
    }

    async fn toggle_incremental_refresh(&self, source_id: i64) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT incremental_refresh_enabled FROM anime_sources WHERE id = ?",
        )
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("source {source_id}")))?;
        let target: bool = !row.try_get::<bool, _>("incremental_refresh_enabled")?;

        sqlx::query(
            "UPDATE anime_sources SET incremental_refresh_enabled = ?, \
             incremental_refresh_failures = 0 WHERE id = ?",
        )
        .bind(target)
        .bind(source_id)
        .execute(&self.pool)
        .await?;
        Ok(target)
    }

    async fn increment_refresh_failures(&self, source_id: i64) -> Result<i32, RepositoryError> {
        sqlx::query(
            "UPDATE anime_sources SET incremental_refresh_failures = \
             incremental_refresh_failures + 1 WHERE id = ?",
        )
        .bind(source_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT incremental_refresh_failures FROM anime_sources WHERE id = ?",
        )
        .bind(source_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("incremental_refresh_failures")?)
    }

    async fn reset_refresh_failures(&self, source_id: i64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE anime_sources SET incremental_refresh_failures = 0 WHERE id = ?")
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn disable_incremental_refresh(&self, source_id: i64) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE anime_sources SET incremental_refresh_enabled = 0 WHERE id = ?",
        )
        .bind(source_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn incremental_refresh_sources(&self) -> Result<Vec<i64>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id FROM anime_sources WHERE incremental_refresh_enabled = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| Ok(row.try_get("id")?))
            .collect()
    }

    async fn clear_data(&self, source_id: i64) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM comment WHERE episode_id IN \
             (SELECT id FROM episode WHERE source_id = ?)",
        )
        .bind(source_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM episode WHERE source_id = ?")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, source_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM anime_sources WHERE id = ?")
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reassociate(
        &self,
        from_anime_id: i64,
        to_anime_id: i64,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for anime_id in [from_anime_id, to_anime_id] {
            let exists = sqlx::query("SELECT 1 FROM anime WHERE id = ?")
                .bind(anime_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Ok(false);
            }
        }

        let sources = sqlx::query(
            "SELECT id, provider_name, media_id FROM anime_sources WHERE anime_id = ?",
        )
        .bind(from_anime_id)
        .fetch_all(&mut *tx)
        .await?;

        for row in &sources {
            let source_id: i64 = row.try_get("id")?;
            let provider: String = row.try_get("provider_name")?;
            let media_id: String = row.try_get("media_id")?;

            let collision = sqlx::query(
                "SELECT 1 FROM anime_sources WHERE anime_id = ? AND provider_name = ? AND media_id = ?",
            )
            .bind(to_anime_id)
            .bind(&provider)
            .bind(&media_id)
            .fetch_optional(&mut *tx)
            .await?;

            if collision.is_some() {
                // The target already carries this binding; the source-side
                // row loses, together with its episodes and comments
                sqlx::query("DELETE FROM anime_sources WHERE id = ?")
                    .bind(source_id)
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query("UPDATE anime_sources SET anime_id = ? WHERE id = ?")
                    .bind(to_anime_id)
                    .bind(source_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("DELETE FROM anime WHERE id = ?")
            .bind(from_anime_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
