//! Episode entity
//!
//! One playable unit under a source. The id is deterministic (see
//! `domain::value_objects::episode_id`) so re-imports keep ids stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Episode entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    /// Deterministic 64-bit id
    pub id: i64,
    /// Owning source
    pub source_id: i64,
    /// 1-based position within the source
    pub episode_index: i32,
    /// The provider's opaque episode id (vid, cid, tvid...)
    pub provider_episode_id: String,
    /// Display title
    pub title: String,
    /// Original page URL, when known
    pub source_url: Option<String>,
    /// When comments were last fetched
    pub fetched_at: Option<DateTime<Utc>>,
    /// Denormalized comment counter, kept in step by bulk inserts/clears
    pub comment_count: i64,
}
