//! Application state shared by every handler

use std::sync::Arc;

use crate::application::services::{MetadataSourceManager, WebhookRegistry};
use crate::application::use_cases::{
    ImportUseCase, MatchUseCase, RefreshUseCase, SearchProviderUseCase,
};
use crate::domain::repositories::{
    AnimeRepository, AuthRepository, CacheRepository, CommentRepository, ConfigRepository,
    EpisodeRepository, SettingsRepository, SourceRepository, TaskRepository,
};
use crate::infrastructure::metadata::TmdbClient;
use crate::infrastructure::scrapers::ScraperRegistry;
use crate::infrastructure::tasks::{Scheduler, TaskManager};

/// Everything the HTTP layer needs, cheaply cloneable
#[derive(Clone)]
pub struct AppState {
    // Repositories
    pub anime_repo: Arc<dyn AnimeRepository>,
    pub source_repo: Arc<dyn SourceRepository>,
    pub episode_repo: Arc<dyn EpisodeRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub cache_repo: Arc<dyn CacheRepository>,
    pub config_repo: Arc<dyn ConfigRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub task_repo: Arc<dyn TaskRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    // Engines
    pub registry: Arc<ScraperRegistry>,
    pub metadata_manager: Arc<MetadataSourceManager>,
    pub tmdb: Arc<TmdbClient>,
    pub task_manager: Arc<TaskManager>,
    pub scheduler: Arc<Scheduler>,
    pub webhooks: Arc<WebhookRegistry>,
    // Use cases
    pub search_use_case: Arc<SearchProviderUseCase>,
    pub import_use_case: Arc<ImportUseCase>,
    pub refresh_use_case: Arc<RefreshUseCase>,
    pub match_use_case: Arc<MatchUseCase>,
}
