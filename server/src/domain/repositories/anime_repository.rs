//! AnimeRepository trait
//!
//! Repository interface for the library's works, their metadata, and their
//! aliases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{Anime, AnimeAliases, AnimeMetadata};
use crate::domain::value_objects::WorkType;
use crate::shared::error::RepositoryError;

/// One row of the library listing
#[derive(Debug, Clone, Serialize)]
pub struct LibraryEntry {
    pub anime_id: i64,
    pub title: String,
    pub work_type: WorkType,
    pub season: i32,
    pub image_url: Option<String>,
    pub local_image_path: Option<String>,
    pub episode_count: i64,
    pub source_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A hit from title search, shaped for the compatibility API
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub anime_id: i64,
    pub title: String,
    pub work_type: WorkType,
    pub image_url: Option<String>,
    pub episode_count: i64,
}

/// A permissive match candidate carrying the ids needed for the TMDB
/// mapping fallback
#[derive(Debug, Clone)]
pub struct MatchCandidateRow {
    pub anime_id: i64,
    pub title: String,
    pub tmdb_id: Option<String>,
    pub tmdb_episode_group_id: Option<String>,
}

/// A concrete local episode reached by the title-based match strategies
#[derive(Debug, Clone)]
pub struct EpisodeMatchRow {
    pub anime_id: i64,
    pub anime_title: String,
    pub work_type: WorkType,
    pub episode_id: i64,
    pub episode_title: String,
}

/// Full anime details including metadata and aliases
#[derive(Debug, Clone, Serialize)]
pub struct AnimeFullDetails {
    pub anime: Anime,
    pub metadata: AnimeMetadata,
    pub aliases: AnimeAliases,
}

/// External ids supplied by an import request; applied write-if-empty
#[derive(Debug, Clone, Default)]
pub struct ExternalIds {
    pub tmdb_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<String>,
}

/// A user-initiated edit of every editable column; bypasses write-if-empty
#[derive(Debug, Clone)]
pub struct AnimeDetailsUpdate {
    pub title: String,
    pub work_type: WorkType,
    pub season: i32,
    pub episode_count: Option<i32>,
    pub image_url: Option<String>,
    pub tmdb_id: Option<String>,
    pub tmdb_episode_group_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<String>,
    pub name_en: Option<String>,
    pub name_jp: Option<String>,
    pub name_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
}

/// Repository for anime data access
#[async_trait]
pub trait AnimeRepository: Send + Sync {
    /// Finds an anime by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Anime>, RepositoryError>;

    /// Finds an anime by `(title, season)`, creating it (plus empty
    /// metadata/aliases rows) when absent. When the row exists but has no
    /// poster yet and this call supplies one, the poster is backfilled.
    async fn get_or_create(
        &self,
        title: &str,
        work_type: WorkType,
        season: i32,
        image_url: Option<&str>,
        local_image_path: Option<&str>,
    ) -> Result<i64, RepositoryError>;

    /// Lists the whole library with per-anime episode and source counts
    async fn list_library(&self) -> Result<Vec<LibraryEntry>, RepositoryError>;

    /// Full details (metadata + aliases) for one anime
    async fn full_details(&self, id: i64) -> Result<Option<AnimeFullDetails>, RepositoryError>;

    /// Applies a user edit to every editable column
    async fn update_details(
        &self,
        id: i64,
        update: &AnimeDetailsUpdate,
    ) -> Result<bool, RepositoryError>;

    /// Deletes an anime and cascades sources, episodes, comments, metadata,
    /// and aliases
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    /// FULLTEXT-style title search for the compatibility API
    async fn search_fulltext(&self, keyword: &str) -> Result<Vec<SearchHit>, RepositoryError>;

    /// LIKE fallback across the title and every alias column, with colons
    /// and spaces folded
    async fn search_like(&self, keyword: &str) -> Result<Vec<SearchHit>, RepositoryError>;

    /// Permissive candidate lookup for the match flow, shortest titles
    /// first, capped at a handful of rows
    async fn find_for_matching(
        &self,
        title: &str,
    ) -> Result<Vec<MatchCandidateRow>, RepositoryError>;

    /// Title-based episode lookup for the match flow: folded-LIKE over the
    /// title and aliases, optionally constrained by season and episode
    /// index, favorites first then scraper display order
    async fn search_episodes_in_library(
        &self,
        title: &str,
        season: Option<i32>,
        episode_index: Option<i32>,
    ) -> Result<Vec<EpisodeMatchRow>, RepositoryError>;

    /// Reads the metadata row
    async fn metadata(&self, id: i64) -> Result<Option<AnimeMetadata>, RepositoryError>;

    /// Applies write-if-empty semantics to the external id columns
    async fn update_metadata_if_empty(
        &self,
        id: i64,
        ids: &ExternalIds,
    ) -> Result<(), RepositoryError>;

    /// Applies write-if-empty semantics to the alias columns
    async fn update_aliases_if_empty(
        &self,
        id: i64,
        aliases: &AnimeAliases,
    ) -> Result<(), RepositoryError>;

    /// Sets the TMDB episode group id (used by the mapping refresh job)
    async fn set_tmdb_episode_group_id(
        &self,
        id: i64,
        group_id: &str,
    ) -> Result<(), RepositoryError>;

    /// Every anime that carries a tmdb id, for the mapping refresh job
    async fn animes_with_tmdb_id(&self) -> Result<Vec<AnimeMetadata>, RepositoryError>;
}
