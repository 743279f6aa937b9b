//! Library matching
//!
//! The dandanplay-shaped read path: search the library by title, and
//! resolve `"Title SxxEyy"`-style requests to a concrete local episode.
//! Three strategies run in order, short-circuiting on the first hit:
//!
//! 1. FULLTEXT-style title search.
//! 2. Folded-LIKE fallback across the title and every alias column.
//! 3. TMDB episode-group mapping, using `(custom_season, custom_episode)`
//!    when the request carries a season, or the absolute episode number
//!    otherwise.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::{
    AnimeRepository, EpisodeGroupRepository, SearchHit,
};
use crate::domain::value_objects::WorkType;
use crate::shared::error::ApplicationError;

/// One match entry, bit-compatible with the player-facing API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchItem {
    pub anime_id: i64,
    pub anime_title: String,
    pub episode_id: i64,
    pub episode_title: String,
    #[serde(rename = "type")]
    pub work_type: WorkType,
    pub shift: f64,
}

/// The match endpoint's payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub is_matched: bool,
    pub matches: Vec<MatchItem>,
}

/// Library search and episode matching
pub struct MatchUseCase {
    anime_repo: Arc<dyn AnimeRepository>,
    group_repo: Arc<dyn EpisodeGroupRepository>,
}

impl MatchUseCase {
    pub fn new(
        anime_repo: Arc<dyn AnimeRepository>,
        group_repo: Arc<dyn EpisodeGroupRepository>,
    ) -> Self {
        Self {
            anime_repo,
            group_repo,
        }
    }

    /// Title search over the library: FULLTEXT first, LIKE fallback
    pub async fn search_library(&self, keyword: &str) -> Result<Vec<SearchHit>, ApplicationError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.anime_repo.search_fulltext(keyword).await?;
        if !hits.is_empty() {
            return Ok(hits);
        }
        Ok(self.anime_repo.search_like(keyword).await?)
    }

    /// Resolves a free-form keyword (usually a file name stem) to local
    /// episodes
    pub async fn match_episode(&self, keyword: &str) -> Result<MatchOutcome, ApplicationError> {
        let parsed = keyword_parser::parse(keyword);
        let season = parsed.season.map(|s| s as i32);
        let episode = parsed.episode.map(|e| e as i32).unwrap_or(1);
        info!(keyword, title = %parsed.title, ?season, episode, "match request");

        // Strategies 1+2: title/alias lookup straight into episodes
        let rows = self
            .anime_repo
            .search_episodes_in_library(&parsed.title, season, Some(episode))
            .await?;
        if !rows.is_empty() {
            let matches = rows
                .into_iter()
                .map(|row| MatchItem {
                    anime_id: row.anime_id,
                    anime_title: row.anime_title,
                    episode_id: row.episode_id,
                    episode_title: row.episode_title,
                    work_type: row.work_type,
                    shift: 0.0,
                })
                .collect();
            return Ok(MatchOutcome {
                is_matched: true,
                matches,
            });
        }

        // Strategy 3: season-override mapping. With a season the custom
        // numbering applies; without one the episode is absolute within
        // the group.
        let candidates = self.anime_repo.find_for_matching(&parsed.title).await?;
        for candidate in candidates {
            let (Some(tmdb_id), Some(group_id)) =
                (&candidate.tmdb_id, &candidate.tmdb_episode_group_id)
            else {
                continue;
            };

            let mapped = self
                .group_repo
                .find_local_episodes(tmdb_id, group_id, season, episode)
                .await?;
            if mapped.is_empty() {
                continue;
            }

            let matches = mapped
                .into_iter()
                .map(|row| MatchItem {
                    anime_id: row.anime_id,
                    anime_title: row.anime_title,
                    episode_id: row.episode_id,
                    episode_title: row.episode_title,
                    work_type: row.work_type,
                    shift: 0.0,
                })
                .collect();
            return Ok(MatchOutcome {
                is_matched: true,
                matches,
            });
        }

        Ok(MatchOutcome {
            is_matched: false,
            matches: Vec::new(),
        })
    }
}
