//! TMDB mapping refresh job
//!
//! Regenerates the episode-group mapping rows for every library entry that
//! carries a tmdb id and a group id.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::application::jobs::Job;
use crate::domain::repositories::{AnimeRepository, EpisodeGroupRepository};
use crate::infrastructure::metadata::tmdb::{materialize_group_mappings, TmdbClient};
use crate::interfaces::progress::ProgressSink;
use crate::shared::error::{MetadataError, TaskError};

/// Episode-group mapping regeneration
pub struct TmdbMappingRefreshJob {
    anime_repo: Arc<dyn AnimeRepository>,
    group_repo: Arc<dyn EpisodeGroupRepository>,
    tmdb: Arc<TmdbClient>,
}

impl TmdbMappingRefreshJob {
    pub fn new(
        anime_repo: Arc<dyn AnimeRepository>,
        group_repo: Arc<dyn EpisodeGroupRepository>,
        tmdb: Arc<TmdbClient>,
    ) -> Self {
        Self {
            anime_repo,
            group_repo,
            tmdb,
        }
    }
}

#[async_trait]
impl Job for TmdbMappingRefreshJob {
    fn job_type(&self) -> &'static str {
        "tmdb_mapping_refresh"
    }

    fn job_name(&self) -> &'static str {
        "TMDB episode-group mapping refresh"
    }

    async fn run(&self, progress: &dyn ProgressSink) -> Result<String, TaskError> {
        let metas = self.anime_repo.animes_with_tmdb_id().await?;
        let targets: Vec<_> = metas
            .into_iter()
            .filter(|m| {
                m.tmdb_id.as_deref().map(|v| !v.is_empty()).unwrap_or(false)
                    && m.tmdb_episode_group_id
                        .as_deref()
                        .map(|v| !v.is_empty())
                        .unwrap_or(false)
            })
            .collect();
        if targets.is_empty() {
            return Ok("no library entries carry an episode group".to_string());
        }

        let total = targets.len();
        let mut updated = 0usize;
        for (i, meta) in targets.iter().enumerate() {
            let percent = ((i as f64 / total as f64) * 100.0).round() as i32;
            progress
                .report(percent, &format!("updating mappings {}/{total}", i + 1))
                .await?;

            let tmdb_id = meta.tmdb_id.as_deref().unwrap_or_default();
            let group_id = meta.tmdb_episode_group_id.as_deref().unwrap_or_default();
            let Ok(tv_id) = tmdb_id.parse::<i64>() else {
                warn!(anime_id = meta.anime_id, tmdb_id, "non-numeric tmdb id, skipping");
                continue;
            };

            match self.tmdb.episode_group_details(group_id).await {
                Ok(details) => {
                    let mappings = materialize_group_mappings(tv_id, &details);
                    self.group_repo.replace_mappings(group_id, &mappings).await?;
                    updated += 1;
                }
                Err(MetadataError::ConfigMissing(key)) => {
                    return Ok(format!("skipped: {key} is not configured"));
                }
                Err(e) => {
                    warn!(anime_id = meta.anime_id, group_id, "group fetch failed: {e}");
                }
            }
        }

        Ok(format!("mapping refresh finished: {updated}/{total} groups updated"))
    }
}
