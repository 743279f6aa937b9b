//! EpisodeGroupRepository trait
//!
//! Persistence for the TMDB episode-group mapping table and the join that
//! resolves a mapped episode to a local one.

use async_trait::async_trait;

use crate::domain::entities::EpisodeGroupMapping;
use crate::domain::value_objects::WorkType;
use crate::shared::error::RepositoryError;

/// A local episode reached through the mapping table
#[derive(Debug, Clone)]
pub struct MappedEpisodeRow {
    pub anime_id: i64,
    pub anime_title: String,
    pub work_type: WorkType,
    pub episode_id: i64,
    pub episode_title: String,
    pub is_favorited: bool,
    pub display_order: i32,
}

/// Repository for TMDB episode-group mappings
#[async_trait]
pub trait EpisodeGroupRepository: Send + Sync {
    /// Atomically replaces every mapping row of `group_id`
    /// (delete-then-insert within one transaction)
    async fn replace_mappings(
        &self,
        group_id: &str,
        mappings: &[EpisodeGroupMapping],
    ) -> Result<(), RepositoryError>;

    /// Resolves a mapped episode to local episodes. With a custom season the
    /// `(custom_season, custom_episode)` index is used; without one the
    /// episode number is treated as absolute within the group. Rows are
    /// ordered favorites first, then by scraper display order.
    async fn find_local_episodes(
        &self,
        tmdb_tv_id: &str,
        group_id: &str,
        custom_season: Option<i32>,
        episode: i32,
    ) -> Result<Vec<MappedEpisodeRow>, RepositoryError>;
}
