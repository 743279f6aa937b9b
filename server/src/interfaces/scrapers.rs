//! Scraper contract
//!
//! Every upstream comment source implements this trait. Site-specific
//! protocol handling stays inside the implementation; what comes out is
//! already cleaned (HTML stripped, colons folded), season-annotated, and
//! junk-filtered.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::WorkType;
use crate::interfaces::progress::ProgressSink;
use crate::shared::error::ScraperError;

/// Danmaku display modes carried in the packed `p` field
pub mod comment_mode {
    /// Right-to-left scrolling comment
    pub const SCROLL: i32 = 1;
    /// Pinned to the bottom
    pub const BOTTOM: i32 = 4;
    /// Pinned to the top
    pub const TOP: i32 = 5;
}

/// Default danmaku color (white)
pub const DEFAULT_COMMENT_COLOR: i32 = 16_777_215;

/// Season/episode hint parsed from the search keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeHint {
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// One search result from a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidate {
    /// Provider key, e.g. "tencent"
    pub provider: String,
    /// The provider's media id for this entry
    pub media_id: String,
    /// Cleaned display title
    pub title: String,
    /// Candidate type; the pipeline may rewrite tv_series to movie
    #[serde(rename = "type")]
    pub work_type: WorkType,
    /// Season parsed from the title when the provider does not expose one
    pub season: i32,
    pub year: Option<i32>,
    pub image_url: Option<String>,
    pub episode_count: Option<i32>,
    /// Echo of the episode requested in the keyword, set by the pipeline
    pub current_episode_index: Option<i32>,
}

/// One episode in a provider's listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeListing {
    pub provider: String,
    /// The provider's opaque episode id
    pub episode_id: String,
    pub title: String,
    /// 1-based position in the listing
    pub episode_index: i32,
    pub url: Option<String>,
}

/// A normalized danmaku comment, ready for bulk insertion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DanmakuComment {
    /// Upstream comment id, unique per episode
    pub cid: String,
    /// Packed parameters: `"t,mode,color,[provider]"`
    pub p: String,
    /// Text content
    pub m: String,
    /// Timestamp in seconds, two decimals
    pub t: f64,
}

impl DanmakuComment {
    /// Builds a comment, packing the `p` field and rounding the timestamp
    /// to two decimals
    pub fn new(
        cid: impl Into<String>,
        seconds: f64,
        mode: i32,
        color: i32,
        provider: &str,
        text: impl Into<String>,
    ) -> Self {
        let t = (seconds * 100.0).round() / 100.0;
        Self {
            cid: cid.into(),
            p: format!("{t:.2},{mode},{color},[{provider}]"),
            m: text.into(),
            t,
        }
    }
}

/// Contract implemented by every upstream comment source
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Stable provider key
    fn provider_name(&self) -> &'static str;

    /// Config keys this scraper understands, with human labels for the UI
    fn configurable_fields(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Whether raw responses may be logged for this provider
    fn is_loggable(&self) -> bool {
        true
    }

    /// Searches the provider. Infallible at the boundary: transport and
    /// protocol failures are logged inside and yield an empty list.
    async fn search(&self, keyword: &str, hint: Option<&EpisodeHint>) -> Vec<SearchCandidate>;

    /// Lists episodes for a media id. With `target_episode_index` set the
    /// result is filtered to that single index after list construction;
    /// movies always come back as exactly one episode with index 1.
    async fn get_episodes(
        &self,
        media_id: &str,
        target_episode_index: Option<i32>,
        db_media_type: Option<WorkType>,
    ) -> Result<Vec<EpisodeListing>, ScraperError>;

    /// Fetches and normalizes the comments of one episode, reporting
    /// download progress through the sink
    async fn get_comments(
        &self,
        provider_episode_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<DanmakuComment>, ScraperError>;

    /// Auxiliary side-effectful operations (login flows, URL parsing).
    /// Unknown actions are an error.
    async fn execute_action(
        &self,
        name: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, ScraperError> {
        let _ = payload;
        Err(ScraperError::ActionNotImplemented(name.to_string()))
    }

    /// Idempotent release of pooled connections
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_packs_p_field() {
        let c = DanmakuComment::new("91803", 12.5, comment_mode::SCROLL, 16777215, "tencent", "233");
        assert_eq!(c.p, "12.50,1,16777215,[tencent]");
        assert_eq!(c.t, 12.5);
    }

    #[test]
    fn comment_rounds_to_two_decimals() {
        let c = DanmakuComment::new("1", 10.0 / 3.0, comment_mode::TOP, 0, "bilibili", "x");
        assert_eq!(c.t, 3.33);
        assert!(c.p.starts_with("3.33,5,0,"));
    }
}
