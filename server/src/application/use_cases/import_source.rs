//! Import pipeline
//!
//! The canonical hard path: list episodes, fetch every episode's comments
//! with scaled progress, and only then touch the database. A failure (or
//! abort) during the network phase leaves the library untouched.

use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::{
    AnimeRepository, CommentRepository, EpisodeRepository, ExternalIds, NewEpisode,
    SourceRepository,
};
use crate::domain::value_objects::WorkType;
use crate::infrastructure::scrapers::ScraperRegistry;
use crate::interfaces::progress::{ProgressSink, SliceProgress};
use crate::interfaces::scrapers::{DanmakuComment, EpisodeListing};
use crate::shared::error::TaskError;

/// Everything an import needs, persisted on task submission
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub provider: String,
    pub media_id: String,
    pub anime_title: String,
    pub work_type: WorkType,
    pub season: i32,
    pub current_episode_index: Option<i32>,
    pub image_url: Option<String>,
    pub external_ids: ExternalIds,
}

/// Import pipeline
pub struct ImportUseCase {
    registry: Arc<ScraperRegistry>,
    anime_repo: Arc<dyn AnimeRepository>,
    source_repo: Arc<dyn SourceRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl ImportUseCase {
    pub fn new(
        registry: Arc<ScraperRegistry>,
        anime_repo: Arc<dyn AnimeRepository>,
        source_repo: Arc<dyn SourceRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            registry,
            anime_repo,
            source_repo,
            episode_repo,
            comment_repo,
        }
    }

    /// Runs the import; the returned string is the task's success message
    pub async fn execute(
        &self,
        request: &ImportRequest,
        progress: &dyn ProgressSink,
    ) -> Result<String, TaskError> {
        let scraper = self.registry.get(&request.provider)?;

        // Last line of defense before anything is stored
        let normalized_title = request.anime_title.replace(':', "：");

        progress.report(10, "fetching episode list").await?;
        let mut episodes = scraper
            .get_episodes(
                &request.media_id,
                request.current_episode_index,
                Some(request.work_type),
            )
            .await?;

        if episodes.is_empty() {
            let message = match request.current_episode_index {
                Some(index) => format!("episode {index} not found"),
                None => "no episodes found".to_string(),
            };
            return Ok(message);
        }

        // Movies sometimes list multiple cuts; only the first one counts
        if request.work_type.is_movie() && episodes.len() > 1 {
            info!(title = %normalized_title, "movie import, keeping only the first entry");
            episodes.truncate(1);
        }

        // Network phase: fetch everything into memory first
        let total = episodes.len();
        let mut fetched: Vec<(EpisodeListing, Vec<DanmakuComment>)> =
            Vec::with_capacity(total);
        for (i, episode) in episodes.into_iter().enumerate() {
            let lo = 10.0 + (i as f64 / total as f64) * 80.0;
            let hi = 10.0 + ((i + 1) as f64 / total as f64) * 80.0;
            progress
                .report(
                    lo.round() as i32,
                    &format!("fetching: {} ({}/{total})", episode.title, i + 1),
                )
                .await?;

            let slice = SliceProgress::new(progress, lo, hi);
            let comments = scraper.get_comments(&episode.episode_id, &slice).await?;
            fetched.push((episode, comments));
        }

        // Write phase: short transactions, no network in between
        progress.report(95, "writing to database").await?;
        let anime_id = self
            .anime_repo
            .get_or_create(
                &normalized_title,
                request.work_type,
                request.season,
                request.image_url.as_deref(),
                None,
            )
            .await?;
        self.anime_repo
            .update_metadata_if_empty(anime_id, &request.external_ids)
            .await?;
        let source_id = self
            .source_repo
            .link(anime_id, &request.provider, &request.media_id)
            .await?;

        let mut inserted_total = 0usize;
        for (episode, comments) in &fetched {
            let episode_db_id = self
                .episode_repo
                .get_or_create(&NewEpisode {
                    anime_id,
                    source_id,
                    episode_index: episode.episode_index,
                    title: episode.title.clone(),
                    source_url: episode.url.clone(),
                    provider_episode_id: episode.episode_id.clone(),
                })
                .await?;
            if comments.is_empty() {
                continue;
            }
            let inserted = self.comment_repo.bulk_insert(episode_db_id, comments).await?;
            inserted_total += inserted;
            info!(
                episode = %episode.title,
                episode_db_id, inserted, "episode comments stored"
            );
        }

        Ok(format!("imported {inserted_total} new comments"))
    }
}
