//! Refresh flows
//!
//! Full source refresh (clear-then-reimport), single-episode delta
//! refresh, and episode renumbering.

use std::sync::Arc;
use tracing::info;

use crate::application::use_cases::import_source::{ImportRequest, ImportUseCase};
use crate::domain::repositories::{
    CommentRepository, EpisodeRepository, ExternalIds, SourceRepository,
};
use crate::infrastructure::scrapers::ScraperRegistry;
use crate::interfaces::progress::{ProgressSink, SliceProgress};
use crate::shared::error::TaskError;

/// Refresh flows over existing sources and episodes
pub struct RefreshUseCase {
    registry: Arc<ScraperRegistry>,
    source_repo: Arc<dyn SourceRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    import: Arc<ImportUseCase>,
}

impl RefreshUseCase {
    pub fn new(
        registry: Arc<ScraperRegistry>,
        source_repo: Arc<dyn SourceRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        import: Arc<ImportUseCase>,
    ) -> Self {
        Self {
            registry,
            source_repo,
            episode_repo,
            comment_repo,
            import,
        }
    }

    /// Full refresh: clear the source's episodes and comments, then re-run
    /// the import with the stored coordinates. The poster is left alone.
    pub async fn full_refresh(
        &self,
        source_id: i64,
        progress: &dyn ProgressSink,
    ) -> Result<String, TaskError> {
        let details = self
            .source_repo
            .details(source_id)
            .await?
            .ok_or_else(|| TaskError::Failed(format!("source {source_id} not found")))?;

        info!(source_id, provider = %details.provider_name, "full refresh started");
        progress.report(5, "clearing old data").await?;
        self.source_repo.clear_data(source_id).await?;

        let request = ImportRequest {
            provider: details.provider_name,
            media_id: details.media_id,
            anime_title: details.title,
            work_type: details.work_type,
            season: details.season,
            current_episode_index: None,
            image_url: None,
            external_ids: ExternalIds {
                tmdb_id: details.tmdb_id,
                ..Default::default()
            },
        };
        self.import.execute(&request, progress).await
    }

    /// Single-episode refresh: fetch upstream, insert only the comments the
    /// episode does not have yet, and stamp `fetched_at`
    pub async fn refresh_episode(
        &self,
        episode_id: i64,
        progress: &dyn ProgressSink,
    ) -> Result<String, TaskError> {
        progress.report(0, "loading episode info").await?;
        let info = self
            .episode_repo
            .provider_info(episode_id)
            .await?
            .ok_or_else(|| {
                TaskError::Failed(format!("no provider info for episode {episode_id}"))
            })?;
        let scraper = self.registry.get(&info.provider_name)?;

        progress.report(30, "fetching comments from source").await?;
        let slice = SliceProgress::new(progress, 30.0, 95.0);
        let upstream = scraper
            .get_comments(&info.provider_episode_id, &slice)
            .await?;

        if upstream.is_empty() {
            self.episode_repo.touch_fetched_at(episode_id).await?;
            return Ok("no comments found upstream".to_string());
        }

        progress.report(95, "diffing against stored comments").await?;
        let existing = self.comment_repo.existing_cids(episode_id).await?;
        let new_comments: Vec<_> = upstream
            .into_iter()
            .filter(|c| !existing.contains(&c.cid))
            .collect();

        if new_comments.is_empty() {
            self.episode_repo.touch_fetched_at(episode_id).await?;
            return Ok("refresh finished, no new comments".to_string());
        }

        progress
            .report(96, &format!("writing {} new comments", new_comments.len()))
            .await?;
        let inserted = self.comment_repo.bulk_insert(episode_id, &new_comments).await?;
        self.episode_repo.touch_fetched_at(episode_id).await?;
        Ok(format!("refresh finished, {inserted} new comments"))
    }

    /// Renumbers a source's episodes 1..=n in listing order
    pub async fn reorder_episodes(
        &self,
        source_id: i64,
        progress: &dyn ProgressSink,
    ) -> Result<String, TaskError> {
        progress.report(10, "renumbering episodes").await?;
        let updated = self.episode_repo.reorder_for_source(source_id).await?;
        Ok(format!("reorder finished, {updated} episodes renumbered"))
    }
}
