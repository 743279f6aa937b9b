//! EpisodeRepository trait

use async_trait::async_trait;

use crate::domain::entities::Episode;
use crate::shared::error::RepositoryError;

/// Input for creating an episode row; the deterministic id is derived
/// inside the repository from the owning anime and source rank
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub anime_id: i64,
    pub source_id: i64,
    pub episode_index: i32,
    pub title: String,
    pub source_url: Option<String>,
    pub provider_episode_id: String,
}

/// Provider coordinates of a stored episode, for single-episode refresh
#[derive(Debug, Clone)]
pub struct EpisodeProviderInfo {
    pub provider_name: String,
    pub provider_episode_id: String,
}

/// Repository for episode data access
#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    /// Creates the episode if `(source_id, episode_index)` is absent and
    /// returns its deterministic id either way
    async fn get_or_create(&self, episode: &NewEpisode) -> Result<i64, RepositoryError>;

    /// Finds an episode by its deterministic id
    async fn find_by_id(&self, episode_id: i64) -> Result<Option<Episode>, RepositoryError>;

    /// Whether the episode row exists
    async fn exists(&self, episode_id: i64) -> Result<bool, RepositoryError>;

    /// All episodes of a source, ordered by episode index
    async fn list_for_source(&self, source_id: i64) -> Result<Vec<Episode>, RepositoryError>;

    /// Provider coordinates for a refresh
    async fn provider_info(
        &self,
        episode_id: i64,
    ) -> Result<Option<EpisodeProviderInfo>, RepositoryError>;

    /// User edit of title/index/url. A duplicate `(source_id, index)` is a
    /// `Duplicate` error, never silently swallowed.
    async fn update_info(
        &self,
        episode_id: i64,
        title: &str,
        episode_index: i32,
        source_url: Option<&str>,
    ) -> Result<bool, RepositoryError>;

    /// Renumbers the source's episodes 1..=n in listing order inside one
    /// transaction; returns how many rows changed
    async fn reorder_for_source(&self, source_id: i64) -> Result<usize, RepositoryError>;

    /// Stamps `fetched_at` with the current time
    async fn touch_fetched_at(&self, episode_id: i64) -> Result<(), RepositoryError>;

    /// Deletes the episode and its comments
    async fn delete(&self, episode_id: i64) -> Result<bool, RepositoryError>;
}
