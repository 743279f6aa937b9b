//! Incremental refresh job
//!
//! Walks every source with incremental refresh enabled and imports only
//! the episodes whose `(source_id, episode_index)` is not stored yet. A
//! source that keeps failing gets its flag dropped once the failure
//! counter reaches the configured threshold.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::jobs::Job;
use crate::domain::repositories::{
    CommentRepository, ConfigRepository, EpisodeRepository, NewEpisode, SourceRepository,
};
use crate::infrastructure::scrapers::ScraperRegistry;
use crate::interfaces::progress::{ProgressSink, SliceProgress};
use crate::shared::error::{ScraperError, TaskError};

const DEFAULT_FAILURE_THRESHOLD: i32 = 10;

/// Incremental refresh of flagged sources
pub struct IncrementalRefreshJob {
    registry: Arc<ScraperRegistry>,
    source_repo: Arc<dyn SourceRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    config: Arc<dyn ConfigRepository>,
}

impl IncrementalRefreshJob {
    pub fn new(
        registry: Arc<ScraperRegistry>,
        source_repo: Arc<dyn SourceRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        config: Arc<dyn ConfigRepository>,
    ) -> Self {
        Self {
            registry,
            source_repo,
            episode_repo,
            comment_repo,
            config,
        }
    }

    async fn failure_threshold(&self) -> i32 {
        self.config
            .get(
                "incremental_refresh_failure_threshold",
                &DEFAULT_FAILURE_THRESHOLD.to_string(),
            )
            .await
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_FAILURE_THRESHOLD)
    }

    /// Imports the missing episodes of one source, returning how many
    /// episodes landed
    async fn refresh_source(
        &self,
        source_id: i64,
        progress: &dyn ProgressSink,
    ) -> Result<usize, TaskError> {
        let Some(details) = self.source_repo.details(source_id).await? else {
            warn!(source_id, "source disappeared before refresh");
            return Ok(0);
        };
        let scraper = self.registry.get(&details.provider_name)?;

        let episodes = scraper
            .get_episodes(&details.media_id, None, Some(details.work_type))
            .await?;
        let known: HashSet<i32> = self
            .episode_repo
            .list_for_source(source_id)
            .await?
            .into_iter()
            .map(|e| e.episode_index)
            .collect();

        let missing: Vec<_> = episodes
            .into_iter()
            .filter(|e| !known.contains(&e.episode_index))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let total = missing.len();
        for (i, episode) in missing.iter().enumerate() {
            let lo = (i as f64 / total as f64) * 100.0;
            let hi = ((i + 1) as f64 / total as f64) * 100.0;
            let slice = SliceProgress::new(progress, lo, hi);
            let comments = scraper.get_comments(&episode.episode_id, &slice).await?;

            let episode_db_id = self
                .episode_repo
                .get_or_create(&NewEpisode {
                    anime_id: details.anime_id,
                    source_id,
                    episode_index: episode.episode_index,
                    title: episode.title.clone(),
                    source_url: episode.url.clone(),
                    provider_episode_id: episode.episode_id.clone(),
                })
                .await?;
            if !comments.is_empty() {
                self.comment_repo.bulk_insert(episode_db_id, &comments).await?;
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl Job for IncrementalRefreshJob {
    fn job_type(&self) -> &'static str {
        "incremental_refresh"
    }

    fn job_name(&self) -> &'static str {
        "Incremental refresh of followed sources"
    }

    async fn run(&self, progress: &dyn ProgressSink) -> Result<String, TaskError> {
        let source_ids = self.source_repo.incremental_refresh_sources().await?;
        if source_ids.is_empty() {
            return Ok("no sources have incremental refresh enabled".to_string());
        }
        let threshold = self.failure_threshold().await;

        let total = source_ids.len();
        let mut refreshed_episodes = 0usize;
        let mut failed_sources = 0usize;
        for (i, source_id) in source_ids.iter().enumerate() {
            let lo = (i as f64 / total as f64) * 100.0;
            let hi = ((i + 1) as f64 / total as f64) * 100.0;
            progress
                .report(
                    lo.round() as i32,
                    &format!("refreshing source {}/{total}", i + 1),
                )
                .await?;

            let slice = SliceProgress::new(progress, lo, hi);
            match self.refresh_source(*source_id, &slice).await {
                Ok(count) => {
                    refreshed_episodes += count;
                    self.source_repo.reset_refresh_failures(*source_id).await?;
                }
                // An abort must stop the whole job, not count as a failure
                Err(TaskError::Aborted) => return Err(TaskError::Aborted),
                Err(TaskError::Scraper(ScraperError::Aborted)) => {
                    return Err(TaskError::Aborted)
                }
                Err(e) => {
                    failed_sources += 1;
                    warn!(source_id, "incremental refresh failed: {e}");
                    let failures = self
                        .source_repo
                        .increment_refresh_failures(*source_id)
                        .await?;
                    if failures >= threshold {
                        info!(
                            source_id, failures,
                            "failure threshold reached, disabling incremental refresh"
                        );
                        self.source_repo
                            .disable_incremental_refresh(*source_id)
                            .await?;
                    }
                }
            }
        }

        Ok(format!(
            "incremental refresh finished: {refreshed_episodes} new episodes, \
             {failed_sources} sources failed"
        ))
    }
}
