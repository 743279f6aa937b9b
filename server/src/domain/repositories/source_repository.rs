//! SourceRepository trait
//!
//! Repository interface for provider bindings of an anime.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::entities::Source;
use crate::domain::value_objects::WorkType;
use crate::shared::error::RepositoryError;

/// A source joined with the owning anime, as needed by refresh tasks
#[derive(Debug, Clone, Serialize)]
pub struct SourceDetails {
    pub source_id: i64,
    pub anime_id: i64,
    pub provider_name: String,
    pub media_id: String,
    pub title: String,
    pub work_type: WorkType,
    pub season: i32,
    pub tmdb_id: Option<String>,
}

/// Repository for source data access
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Links a provider's media id to an anime, returning the existing
    /// source id when the `(anime_id, provider, media_id)` triple is
    /// already present
    async fn link(
        &self,
        anime_id: i64,
        provider_name: &str,
        media_id: &str,
    ) -> Result<i64, RepositoryError>;

    /// Finds a source by id
    async fn find_by_id(&self, source_id: i64) -> Result<Option<Source>, RepositoryError>;

    /// Source plus owning-anime columns, for refresh tasks
    async fn details(&self, source_id: i64) -> Result<Option<SourceDetails>, RepositoryError>;

    /// All sources of one anime, ordered by id
    async fn list_for_anime(&self, anime_id: i64) -> Result<Vec<Source>, RepositoryError>;

    /// The 1-based rank of a source among its anime's sources ordered by id
    /// ascending. Errors when the source does not belong to the anime.
    async fn source_order(&self, anime_id: i64, source_id: i64) -> Result<i64, RepositoryError>;

    /// Toggles the favorite flag; setting it clears the flag on all sibling
    /// sources so at most one source per anime is favorited
    async fn toggle_favorite(&self, source_id: i64) -> Result<bool, RepositoryError>;

    /// Toggles the incremental refresh flag
    async fn toggle_incremental_refresh(&self, source_id: i64) -> Result<bool, RepositoryError>;

    /// Bumps the failure counter, returning the new value
    async fn increment_refresh_failures(&self, source_id: i64) -> Result<i32, RepositoryError>;

    /// Resets the failure counter to zero
    async fn reset_refresh_failures(&self, source_id: i64) -> Result<(), RepositoryError>;

    /// Drops the incremental refresh flag (threshold reached)
    async fn disable_incremental_refresh(&self, source_id: i64) -> Result<(), RepositoryError>;

    /// Ids of every source with incremental refresh enabled
    async fn incremental_refresh_sources(&self) -> Result<Vec<i64>, RepositoryError>;

    /// Deletes all episodes (and their comments) under the source, keeping
    /// the source row itself
    async fn clear_data(&self, source_id: i64) -> Result<(), RepositoryError>;

    /// Deletes the source, cascading episodes and comments
    async fn delete(&self, source_id: i64) -> Result<bool, RepositoryError>;

    /// Moves every source of `from_anime_id` under `to_anime_id`, deleting
    /// colliding source-side rows, then deletes the emptied origin anime
    async fn reassociate(&self, from_anime_id: i64, to_anime_id: i64)
        -> Result<bool, RepositoryError>;
}
