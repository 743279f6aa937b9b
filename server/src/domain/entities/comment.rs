//! Comment entity
//!
//! One timed text overlay (danmaku). Rows are only ever inserted (ignoring
//! duplicates on `(episode_id, cid)`) or bulk-deleted with their parent.

use serde::{Deserialize, Serialize};

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    /// Surrogate id
    pub id: i64,
    /// Owning episode (deterministic id)
    pub episode_id: i64,
    /// The upstream comment id, unique within the episode
    pub cid: String,
    /// Packed parameters: `"t,mode,color,[provider]"`
    pub p: String,
    /// Text content
    pub m: String,
    /// Timestamp in seconds, two decimals
    pub t: f64,
}
