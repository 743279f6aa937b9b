//! TMDB episode-group mapping entity
//!
//! Materializes a TMDB episode group into one row per episode so that
//! season-override matching can resolve `(custom_season, custom_episode)` or
//! an absolute episode number to a local episode.

use serde::{Deserialize, Serialize};

/// One materialized mapping row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeGroupMapping {
    pub tmdb_tv_id: i64,
    pub tmdb_episode_group_id: String,
    pub tmdb_episode_id: i64,
    /// Canonical TMDB numbering
    pub tmdb_season_number: i32,
    pub tmdb_episode_number: i32,
    /// Group-defined numbering: the group's `order` is the custom season,
    /// the episode's 1-based position inside the group is the custom episode
    pub custom_season_number: i32,
    pub custom_episode_number: i32,
    /// 1-based position across the whole group
    pub absolute_episode_number: i32,
}
