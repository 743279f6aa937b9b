//! SQLite Episode Repository Implementation
//!
//! Episode ids come from the deterministic scheme in
//! `domain::value_objects::episode_id`; this repository derives the source
//! rank at insert time.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

use crate::domain::entities::Episode;
use crate::domain::repositories::{EpisodeProviderInfo, EpisodeRepository, NewEpisode};
use crate::domain::value_objects::deterministic_episode_id;
use crate::shared::error::{DomainError, RepositoryError};

fn map_episode(row: &sqlx::sqlite::SqliteRow) -> Result<Episode, RepositoryError> {
    Ok(Episode {
        id: row.try_get("id")?,
        source_id: row.try_get("source_id")?,
        episode_index: row.try_get("episode_index")?,
        provider_episode_id: row.try_get("provider_episode_id")?,
        title: row.try_get("title")?,
        source_url: row.try_get("source_url")?,
        fetched_at: row.try_get("fetched_at")?,
        comment_count: row.try_get("comment_count")?,
    })
}

/// SQLite implementation of EpisodeRepository
pub struct SqliteEpisodeRepository {
    pool: Pool<Sqlite>,
}

impl SqliteEpisodeRepository {
    /// Creates a new SQLite episode repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EpisodeRepository for SqliteEpisodeRepository {
    async fn get_or_create(&self, episode: &NewEpisode) -> Result<i64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            "SELECT id FROM episode WHERE source_id = ? AND episode_index = ?",
        )
        .bind(episode.source_id)
        .bind(episode.episode_index)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(row) = existing {
            return Ok(row.try_get("id")?);
        }

        // 1-based rank of this source among the anime's sources by id
        let source_rows = sqlx::query(
            "SELECT id FROM anime_sources WHERE anime_id = ? ORDER BY id ASC",
        )
        .bind(episode.anime_id)
        .fetch_all(&mut *tx)
        .await?;
        let mut source_order = None;
        for (idx, row) in source_rows.iter().enumerate() {
            let id: i64 = row.try_get("id")?;
            if id == episode.source_id {
                source_order = Some(idx as i64 + 1);
                break;
            }
        }
        let source_order = source_order.ok_or_else(|| {
            RepositoryError::Domain(DomainError::InvariantViolation(format!(
                "source {} does not belong to anime {}",
                episode.source_id, episode.anime_id
            )))
        })?;

        let episode_id =
            deterministic_episode_id(episode.anime_id, source_order, episode.episode_index)
                .map_err(RepositoryError::Domain)?;

        sqlx::query(
            "INSERT INTO episode \
             (id, source_id, episode_index, provider_episode_id, title, source_url, fetched_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(episode_id)
        .bind(episode.source_id)
        .bind(episode.episode_index)
        .bind(&episode.provider_episode_id)
        .bind(&episode.title)
        .bind(&episode.source_url)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(episode_id)
    }

    async fn find_by_id(&self, episode_id: i64) -> Result<Option<Episode>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM episode WHERE id = ?")
            .bind(episode_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_episode).transpose()
    }

    async fn exists(&self, episode_id: i64) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM episode WHERE id = ?")
            .bind(episode_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn list_for_source(&self, source_id: i64) -> Result<Vec<Episode>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM episode WHERE source_id = ? ORDER BY episode_index ASC",
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_episode).collect()
    }

    async fn provider_info(
        &self,
        episode_id: i64,
    ) -> Result<Option<EpisodeProviderInfo>, RepositoryError> {
        let row = sqlx::query(
            "SELECT s.provider_name, e.provider_episode_id \
             FROM episode e JOIN anime_sources s ON e.source_id = s.id \
             WHERE e.id = ?",
        )
        .bind(episode_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(EpisodeProviderInfo {
                provider_name: row.try_get("provider_name")?,
                provider_episode_id: row.try_get("provider_episode_id")?,
            })
        })
        .transpose()
    }

    async fn update_info(
        &self,
        episode_id: i64,
        title: &str,
        episode_index: i32,
        source_url: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let Some(current) = self.find_by_id(episode_id).await? else {
            return Ok(false);
        };

        if episode_index != current.episode_index {
            let occupied = sqlx::query(
                "SELECT id FROM episode WHERE source_id = ? AND episode_index = ? AND id != ?",
            )
            .bind(current.source_id)
            .bind(episode_index)
            .bind(episode_id)
            .fetch_optional(&self.pool)
            .await?;
            if occupied.is_some() {
                return Err(RepositoryError::Duplicate(format!(
                    "episode index {episode_index} already exists in source {}",
                    current.source_id
                )));
            }
        }

        sqlx::query(
            "UPDATE episode SET title = ?, episode_index = ?, source_url = ? WHERE id = ?",
        )
        .bind(title)
        .bind(episode_index)
        .bind(source_url)
        .bind(episode_id)
        .execute(&self.pool)
        .await?;
        Ok(true)
    }

    async fn reorder_for_source(&self, source_id: i64) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT id, episode_index FROM episode WHERE source_id = ? ORDER BY episode_index ASC",
        )
        .bind(source_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut updated = 0usize;
        for (i, row) in rows.iter().enumerate() {
            let id: i64 = row.try_get("id")?;
            let index: i32 = row.try_get("episode_index")?;
            let target = i as i32 + 1;
            if index != target {
                sqlx::query("UPDATE episode SET episode_index = ? WHERE id = ?")
                    .bind(target)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                updated += 1;
            }
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn touch_fetched_at(&self, episode_id: i64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE episode SET fetched_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(episode_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, episode_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM episode WHERE id = ?")
            .bind(episode_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
