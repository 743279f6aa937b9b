//! SQLite Anime Repository Implementation
//!
//! Library works plus their 1:1 metadata and alias rows. Deletion relies on
//! the `ON DELETE CASCADE` chain anime -> sources -> episodes -> comments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::domain::entities::{Anime, AnimeAliases, AnimeMetadata};
use crate::domain::repositories::{
    AnimeDetailsUpdate, AnimeFullDetails, AnimeRepository, EpisodeMatchRow, ExternalIds,
    LibraryEntry, MatchCandidateRow, SearchHit,
};
use crate::domain::value_objects::WorkType;
use crate::shared::error::RepositoryError;
use crate::shared::text::TitleNormalizer;

const EPISODE_COUNT_SUBQUERY: &str = "(SELECT COUNT(*) FROM episode e \
     JOIN anime_sources s ON e.source_id = s.id WHERE s.anime_id = a.id)";

/// The LIKE fold applied to title and alias columns: drop spaces, unify
/// colons. Mirrors `TitleNormalizer::fold_for_matching` on the SQL side.
fn folded(col: &str) -> String {
    format!("REPLACE(REPLACE(LOWER({col}), '：', ':'), ' ', '')")
}

fn map_anime(row: &sqlx::sqlite::SqliteRow) -> Result<Anime, RepositoryError> {
    let type_str: String = row.try_get("type")?;
    Ok(Anime {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        work_type: WorkType::from_str(&type_str).map_err(RepositoryError::Domain)?,
        season: row.try_get("season")?,
        image_url: row.try_get("image_url")?,
        local_image_path: row.try_get("local_image_path")?,
        episode_count: row.try_get("episode_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_metadata(row: &sqlx::sqlite::SqliteRow) -> Result<AnimeMetadata, RepositoryError> {
    Ok(AnimeMetadata {
        anime_id: row.try_get("anime_id")?,
        tmdb_id: row.try_get("tmdb_id")?,
        tmdb_episode_group_id: row.try_get("tmdb_episode_group_id")?,
        imdb_id: row.try_get("imdb_id")?,
        tvdb_id: row.try_get("tvdb_id")?,
        douban_id: row.try_get("douban_id")?,
        bangumi_id: row.try_get("bangumi_id")?,
    })
}

fn map_aliases(row: &sqlx::sqlite::SqliteRow) -> Result<AnimeAliases, RepositoryError> {
    Ok(AnimeAliases {
        anime_id: row.try_get("anime_id")?,
        name_en: row.try_get("name_en")?,
        name_jp: row.try_get("name_jp")?,
        name_romaji: row.try_get("name_romaji")?,
        alias_cn_1: row.try_get("alias_cn_1")?,
        alias_cn_2: row.try_get("alias_cn_2")?,
        alias_cn_3: row.try_get("alias_cn_3")?,
    })
}

fn map_search_hit(row: &sqlx::sqlite::SqliteRow) -> Result<SearchHit, RepositoryError> {
    let type_str: String = row.try_get("type")?;
    Ok(SearchHit {
        anime_id: row.try_get("id")?,
        title: row.try_get("title")?,
        work_type: WorkType::from_str(&type_str).map_err(RepositoryError::Domain)?,
        image_url: row.try_get("image_url")?,
        episode_count: row.try_get("episode_count")?,
    })
}

/// SQLite implementation of AnimeRepository
pub struct SqliteAnimeRepository {
    pool: Pool<Sqlite>,
}

impl SqliteAnimeRepository {
    /// Creates a new SQLite anime repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn write_if_empty(
        &self,
        table: &str,
        column: &str,
        anime_id: i64,
        value: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        let sql = format!(
            "UPDATE {table} SET {column} = ? WHERE anime_id = ? AND ({column} IS NULL OR {column} = '')"
        );
        sqlx::query(&sql)
            .bind(value)
            .bind(anime_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AnimeRepository for SqliteAnimeRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Anime>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM anime WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_anime).transpose()
    }

    async fn get_or_create(
        &self,
        title: &str,
        work_type: WorkType,
        season: i32,
        image_url: Option<&str>,
        local_image_path: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let existing = sqlx::query(
            "SELECT id, image_url, local_image_path FROM anime WHERE title = ? AND season = ?",
        )
        .bind(title)
        .bind(season)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = existing {
            let anime_id: i64 = row.try_get("id")?;
            let existing_image: Option<String> = row.try_get("image_url")?;
            let existing_local: Option<String> = row.try_get("local_image_path")?;

            // Backfill posters the existing row is missing; never overwrite
            if existing_image.is_none() {
                if let Some(url) = image_url {
                    sqlx::query("UPDATE anime SET image_url = ? WHERE id = ?")
                        .bind(url)
                        .bind(anime_id)
                        .execute(&self.pool)
                        .await?;
                }
            }
            if existing_local.is_none() {
                if let Some(path) = local_image_path {
                    sqlx::query("UPDATE anime SET local_image_path = ? WHERE id = ?")
                        .bind(path)
                        .bind(anime_id)
                        .execute(&self.pool)
                        .await?;
                }
            }
            return Ok(anime_id);
        }

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO anime (title, type, season, image_url, local_image_path, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(work_type.as_str())
        .bind(season)
        .bind(image_url)
        .bind(local_image_path)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        let anime_id = result.last_insert_rowid();

        sqlx::query("INSERT OR IGNORE INTO anime_metadata (anime_id) VALUES (?)")
            .bind(anime_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT OR IGNORE INTO anime_aliases (anime_id) VALUES (?)")
            .bind(anime_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(anime_id)
    }

    async fn list_library(&self) -> Result<Vec<LibraryEntry>, RepositoryError> {
        let sql = format!(
            "SELECT a.id, a.title, a.type, a.season, a.image_url, a.local_image_path, \
             a.created_at, {EPISODE_COUNT_SUBQUERY} AS episode_count, \
             (SELECT COUNT(*) FROM anime_sources s WHERE s.anime_id = a.id) AS source_count \
             FROM anime a ORDER BY a.created_at DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let type_str: String = row.try_get("type")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;
                Ok(LibraryEntry {
                    anime_id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    work_type: WorkType::from_str(&type_str).map_err(RepositoryError::Domain)?,
                    season: row.try_get("season")?,
                    image_url: row.try_get("image_url")?,
                    local_image_path: row.try_get("local_image_path")?,
                    episode_count: row.try_get("episode_count")?,
                    source_count: row.try_get("source_count")?,
                    created_at,
                })
            })
            .collect()
    }

    async fn full_details(&self, id: i64) -> Result<Option<AnimeFullDetails>, RepositoryError> {
        let Some(anime) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let metadata = sqlx::query("SELECT * FROM anime_metadata WHERE anime_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(map_metadata)
            .transpose()?
            .unwrap_or(AnimeMetadata {
                anime_id: id,
                ..Default::default()
            });

        let aliases = sqlx::query("SELECT * FROM anime_aliases WHERE anime_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(map_aliases)
            .transpose()?
            .unwrap_or(AnimeAliases {
                anime_id: id,
                ..Default::default()
            });

        Ok(Some(AnimeFullDetails {
            anime,
            metadata,
            aliases,
        }))
    }

    async fn update_details(
        &self,
        id: i64,
        update: &AnimeDetailsUpdate,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE anime SET title = ?, type = ?, season = ?, episode_count = ?, image_url = ? \
             WHERE id = ?",
        )
        .bind(&update.title)
        .bind(update.work_type.as_str())
        .bind(update.season)
        .bind(update.episode_count)
        .bind(&update.image_url)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO anime_metadata \
             (anime_id, tmdb_id, tmdb_episode_group_id, imdb_id, tvdb_id, douban_id, bangumi_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(anime_id) DO UPDATE SET \
             tmdb_id = excluded.tmdb_id, \
             tmdb_episode_group_id = excluded.tmdb_episode_group_id, \
             imdb_id = excluded.imdb_id, \
             tvdb_id = excluded.tvdb_id, \
             douban_id = excluded.douban_id, \
             bangumi_id = excluded.bangumi_id",
        )
        .bind(id)
        .bind(&update.tmdb_id)
        .bind(&update.tmdb_episode_group_id)
        .bind(&update.imdb_id)
        .bind(&update.tvdb_id)
        .bind(&update.douban_id)
        .bind(&update.bangumi_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO anime_aliases \
             (anime_id, name_en, name_jp, name_romaji, alias_cn_1, alias_cn_2, alias_cn_3) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(anime_id) DO UPDATE SET \
             name_en = excluded.name_en, \
             name_jp = excluded.name_jp, \
             name_romaji = excluded.name_romaji, \
             alias_cn_1 = excluded.alias_cn_1, \
             alias_cn_2 = excluded.alias_cn_2, \
             alias_cn_3 = excluded.alias_cn_3",
        )
        .bind(id)
        .bind(&update.name_en)
        .bind(&update.name_jp)
        .bind(&update.name_romaji)
        .bind(&update.alias_cn_1)
        .bind(&update.alias_cn_2)
        .bind(&update.alias_cn_3)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM anime WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_fulltext(&self, keyword: &str) -> Result<Vec<SearchHit>, RepositoryError> {
        let sanitized = TitleNormalizer::sanitize_for_fulltext(keyword);
        let tokens: Vec<&str> = sanitized.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        // Every token must appear somewhere in the title
        let conditions = vec!["a.title LIKE ?"; tokens.len()].join(" AND ");
        let sql = format!(
            "SELECT a.id, a.title, a.type, a.image_url, \
             {EPISODE_COUNT_SUBQUERY} AS episode_count \
             FROM anime a WHERE {conditions} ORDER BY a.id"
        );

        let mut query = sqlx::query(&sql);
        for token in &tokens {
            query = query.bind(format!("%{token}%"));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(map_search_hit).collect()
    }

    async fn search_like(&self, keyword: &str) -> Result<Vec<SearchHit>, RepositoryError> {
        let pattern = format!("%{}%", TitleNormalizer::fold_for_matching(keyword));
        let alias_cols = [
            "al.name_en",
            "al.name_jp",
            "al.name_romaji",
            "al.alias_cn_1",
            "al.alias_cn_2",
            "al.alias_cn_3",
        ];
        let mut conditions = vec![format!("{} LIKE ?", folded("a.title"))];
        conditions.extend(alias_cols.iter().map(|c| format!("{} LIKE ?", folded(c))));

        let sql = format!(
            "SELECT DISTINCT a.id, a.title, a.type, a.image_url, \
             {EPISODE_COUNT_SUBQUERY} AS episode_count \
             FROM anime a LEFT JOIN anime_aliases al ON a.id = al.anime_id \
             WHERE {} ORDER BY a.id",
            conditions.join(" OR ")
        );

        let mut query = sqlx::query(&sql);
        for _ in 0..=alias_cols.len() {
            query = query.bind(&pattern);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(map_search_hit).collect()
    }

    async fn find_for_matching(
        &self,
        title: &str,
    ) -> Result<Vec<MatchCandidateRow>, RepositoryError> {
        let pattern = format!("%{}%", TitleNormalizer::fold_for_matching(title));
        let alias_cols = [
            "al.name_en",
            "al.name_jp",
            "al.name_romaji",
            "al.alias_cn_1",
            "al.alias_cn_2",
            "al.alias_cn_3",
        ];
        let mut conditions = vec![format!("{} LIKE ?", folded("a.title"))];
        conditions.extend(alias_cols.iter().map(|c| format!("{} LIKE ?", folded(c))));

        // Deliberately permissive; shortest titles first so the most exact
        // match tends to surface on top
        let sql = format!(
            "SELECT DISTINCT a.id, a.title, m.tmdb_id, m.tmdb_episode_group_id \
             FROM anime a \
             LEFT JOIN anime_metadata m ON a.id = m.anime_id \
             LEFT JOIN anime_aliases al ON a.id = al.anime_id \
             WHERE {} ORDER BY LENGTH(a.title) ASC LIMIT 5",
            conditions.join(" OR ")
        );

        let mut query = sqlx::query(&sql);
        for _ in 0..=alias_cols.len() {
            query = query.bind(&pattern);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(MatchCandidateRow {
                    anime_id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    tmdb_id: row.try_get("tmdb_id")?,
                    tmdb_episode_group_id: row.try_get("tmdb_episode_group_id")?,
                })
            })
            .collect()
    }

    async fn search_episodes_in_library(
        &self,
        title: &str,
        season: Option<i32>,
        episode_index: Option<i32>,
    ) -> Result<Vec<EpisodeMatchRow>, RepositoryError> {
        let pattern = format!("%{}%", TitleNormalizer::fold_for_matching(title));
        let alias_cols = [
            "al.name_en",
            "al.name_jp",
            "al.name_romaji",
            "al.alias_cn_1",
            "al.alias_cn_2",
            "al.alias_cn_3",
        ];
        let mut title_conditions = vec![format!("{} LIKE ?", folded("a.title"))];
        title_conditions.extend(alias_cols.iter().map(|c| format!("{} LIKE ?", folded(c))));

        let mut extra = String::new();
        if season.is_some() {
            extra.push_str(" AND a.season = ?");
        }
        if episode_index.is_some() {
            extra.push_str(" AND e.episode_index = ?");
        }

        let sql = format!(
            "SELECT DISTINCT a.id AS anime_id, a.title AS anime_title, a.type AS work_type, \
             e.id AS episode_id, e.title AS episode_title, \
             s.is_favorited, COALESCE(sc.display_order, 999) AS display_order \
             FROM anime a \
             LEFT JOIN anime_aliases al ON a.id = al.anime_id \
             JOIN anime_sources s ON s.anime_id = a.id \
             JOIN episode e ON e.source_id = s.id \
             LEFT JOIN scrapers sc ON s.provider_name = sc.provider_name \
             WHERE ({}){extra} \
             ORDER BY s.is_favorited DESC, display_order ASC, a.id ASC",
            title_conditions.join(" OR ")
        );

        let mut query = sqlx::query(&sql);
        for _ in 0..=alias_cols.len() {
            query = query.bind(&pattern);
        }
        if let Some(season) = season {
            query = query.bind(season);
        }
        if let Some(index) = episode_index {
            query = query.bind(index);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let type_str: String = row.try_get("work_type")?;
                Ok(EpisodeMatchRow {
                    anime_id: row.try_get("anime_id")?,
                    anime_title: row.try_get("anime_title")?,
                    work_type: WorkType::from_str(&type_str).map_err(RepositoryError::Domain)?,
                    episode_id: row.try_get("episode_id")?,
                    episode_title: row.try_get("episode_title")?,
                })
            })
            .collect()
    }

    async fn metadata(&self, id: i64) -> Result<Option<AnimeMetadata>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM anime_metadata WHERE anime_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_metadata).transpose()
    }

    async fn update_metadata_if_empty(
        &self,
        id: i64,
        ids: &ExternalIds,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO anime_metadata (anime_id) VALUES (?)")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.write_if_empty("anime_metadata", "tmdb_id", id, ids.tmdb_id.as_deref())
            .await?;
        self.write_if_empty("anime_metadata", "imdb_id", id, ids.imdb_id.as_deref())
            .await?;
        self.write_if_empty("anime_metadata", "tvdb_id", id, ids.tvdb_id.as_deref())
            .await?;
        self.write_if_empty("anime_metadata", "douban_id", id, ids.douban_id.as_deref())
            .await?;
        self.write_if_empty("anime_metadata", "bangumi_id", id, ids.bangumi_id.as_deref())
            .await?;
        Ok(())
    }

    async fn update_aliases_if_empty(
        &self,
        id: i64,
        aliases: &AnimeAliases,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO anime_aliases (anime_id) VALUES (?)")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.write_if_empty("anime_aliases", "name_en", id, aliases.name_en.as_deref())
            .await?;
        self.write_if_empty("anime_aliases", "name_jp", id, aliases.name_jp.as_deref())
            .await?;
        self.write_if_empty(
            "anime_aliases",
            "name_romaji",
            id,
            aliases.name_romaji.as_deref(),
        )
        .await?;
        self.write_if_empty(
            "anime_aliases",
            "alias_cn_1",
            id,
            aliases.alias_cn_1.as_deref(),
        )
        .await?;
        self.write_if_empty(
            "anime_aliases",
            "alias_cn_2",
            id,
            aliases.alias_cn_2.as_deref(),
        )
        .await?;
        self.write_if_empty(
            "anime_aliases",
            "alias_cn_3",
            id,
            aliases.alias_cn_3.as_deref(),
        )
        .await?;
        Ok(())
    }

    async fn set_tmdb_episode_group_id(
        &self,
        id: i64,
        group_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE anime_metadata SET tmdb_episode_group_id = ? WHERE anime_id = ?")
            .bind(group_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn animes_with_tmdb_id(&self) -> Result<Vec<AnimeMetadata>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM anime_metadata WHERE tmdb_id IS NOT NULL AND tmdb_id != ''",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_metadata).collect()
    }
}
