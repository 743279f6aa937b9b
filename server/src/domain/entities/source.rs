//! Source entity
//!
//! Binds an anime to one upstream provider's media id. An anime can have
//! several sources; at most one of them is the favorite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// Unique identifier
    pub id: i64,
    /// Owning anime
    pub anime_id: i64,
    /// Provider key, e.g. "bilibili"
    pub provider_name: String,
    /// The provider's media id (season id, cid, album id...)
    pub media_id: String,
    /// Preferred source for playback-time matching
    pub is_favorited: bool,
    /// Included in the scheduled incremental refresh
    pub incremental_refresh_enabled: bool,
    /// Consecutive incremental-refresh failures; the flag above is dropped
    /// when this reaches the configured threshold
    pub incremental_refresh_failures: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
