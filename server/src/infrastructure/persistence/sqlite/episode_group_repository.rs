//! SQLite Episode Group Repository Implementation
//!
//! Materialized TMDB episode-group mappings plus the join resolving them to
//! local episodes.

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::domain::entities::EpisodeGroupMapping;
use crate::domain::repositories::{EpisodeGroupRepository, MappedEpisodeRow};
use crate::domain::value_objects::WorkType;
use crate::shared::error::RepositoryError;

/// SQLite implementation of EpisodeGroupRepository
pub struct SqliteEpisodeGroupRepository {
    pool: Pool<Sqlite>,
}

impl SqliteEpisodeGroupRepository {
    /// Creates a new SQLite episode group repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EpisodeGroupRepository for SqliteEpisodeGroupRepository {
    async fn replace_mappings(
        &self,
        group_id: &str,
        mappings: &[EpisodeGroupMapping],
    ) -> Result<(), RepositoryError> {
        // Delete-then-insert in one transaction so readers never see a
        // partial map
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tmdb_episode_mapping WHERE tmdb_episode_group_id = ?")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        for mapping in mappings {
            sqlx::query(
                "INSERT INTO tmdb_episode_mapping \
                 (tmdb_tv_id, tmdb_episode_group_id, tmdb_episode_id, tmdb_season_number, \
                  tmdb_episode_number, custom_season_number, custom_episode_number, \
                  absolute_episode_number) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(mapping.tmdb_tv_id)
            .bind(&mapping.tmdb_episode_group_id)
            .bind(mapping.tmdb_episode_id)
            .bind(mapping.tmdb_season_number)
            .bind(mapping.tmdb_episode_number)
            .bind(mapping.custom_season_number)
            .bind(mapping.custom_episode_number)
            .bind(mapping.absolute_episode_number)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_local_episodes(
        &self,
        tmdb_tv_id: &str,
        group_id: &str,
        custom_season: Option<i32>,
        episode: i32,
    ) -> Result<Vec<MappedEpisodeRow>, RepositoryError> {
        let episode_condition = if custom_season.is_some() {
            "tm.custom_season_number = ? AND tm.custom_episode_number = ?"
        } else {
            "tm.absolute_episode_number = ?"
        };

        let sql = format!(
            "SELECT a.id AS anime_id, a.title AS anime_title, a.type AS work_type, \
             e.id AS episode_id, e.title AS episode_title, \
             s.is_favorited, sc.display_order \
             FROM tmdb_episode_mapping tm \
             JOIN anime_metadata am \
               ON am.tmdb_id = ? AND am.tmdb_episode_group_id = tm.tmdb_episode_group_id \
             JOIN anime a ON am.anime_id = a.id \
             JOIN anime_sources s ON a.id = s.anime_id \
             JOIN episode e ON s.id = e.source_id \
               AND e.episode_index = tm.absolute_episode_number \
             JOIN scrapers sc ON s.provider_name = sc.provider_name \
             WHERE tm.tmdb_tv_id = CAST(? AS INTEGER) AND tm.tmdb_episode_group_id = ? \
               AND {episode_condition} \
             ORDER BY s.is_favorited DESC, sc.display_order ASC"
        );

        let mut query = sqlx::query(&sql)
            .bind(tmdb_tv_id)
            .bind(tmdb_tv_id)
            .bind(group_id);
        if let Some(season) = custom_season {
            query = query.bind(season).bind(episode);
        } else {
            query = query.bind(episode);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let type_str: String = row.try_get("work_type")?;
                Ok(MappedEpisodeRow {
                    anime_id: row.try_get("anime_id")?,
                    anime_title: row.try_get("anime_title")?,
                    work_type: WorkType::from_str(&type_str).map_err(RepositoryError::Domain)?,
                    episode_id: row.try_get("episode_id")?,
                    episode_title: row.try_get("episode_title")?,
                    is_favorited: row.try_get("is_favorited")?,
                    display_order: row.try_get("display_order")?,
                })
            })
            .collect()
    }
}
