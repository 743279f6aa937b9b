//! Shared test fixtures: a file-backed SQLite database per test, repository
//! construction, and a configurable mock scraper.

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use danmud::domain::repositories::{
    AnimeRepository, AuthRepository, CacheRepository, CommentRepository, ConfigRepository,
    EpisodeGroupRepository, EpisodeRepository, ScheduledTaskRepository, SettingsRepository,
    SourceRepository, TaskRepository,
};
use danmud::domain::value_objects::WorkType;
use danmud::infrastructure::database::{initialize_schema, ConnectionPool, ConnectionPoolConfig};
use danmud::infrastructure::persistence::sqlite::{
    SqliteAnimeRepository, SqliteAuthRepository, SqliteCacheRepository, SqliteCommentRepository,
    SqliteConfigRepository, SqliteEpisodeGroupRepository, SqliteEpisodeRepository,
    SqliteScheduledTaskRepository, SqliteSettingsRepository, SqliteSourceRepository,
    SqliteTaskRepository,
};
use danmud::interfaces::metadata::{MetadataSource, SourceStatus};
use danmud::interfaces::progress::ProgressSink;
use danmud::interfaces::scrapers::{
    comment_mode, DanmakuComment, EpisodeHint, EpisodeListing, Scraper, SearchCandidate,
};
use danmud::shared::error::{MetadataError, ScraperError};
use std::collections::HashSet;

/// A test database plus every repository over it
pub struct TestDb {
    // Held for its Drop: the directory (and database) disappears with it
    #[allow(dead_code)]
    tempdir: TempDir,
    pub pool: Pool<Sqlite>,
    pub anime_repo: Arc<dyn AnimeRepository>,
    pub source_repo: Arc<dyn SourceRepository>,
    pub episode_repo: Arc<dyn EpisodeRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub cache_repo: Arc<dyn CacheRepository>,
    pub config_repo: Arc<dyn ConfigRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub task_repo: Arc<dyn TaskRepository>,
    pub scheduled_repo: Arc<dyn ScheduledTaskRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub group_repo: Arc<dyn EpisodeGroupRepository>,
}

impl TestDb {
    pub async fn new() -> Self {
        let tempdir = TempDir::new().expect("tempdir");
        let db_path = tempdir.path().join("test.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = ConnectionPool::create(ConnectionPoolConfig::new(url))
            .await
            .expect("pool")
            .inner()
            .clone();
        initialize_schema(&pool).await.expect("schema");

        Self {
            tempdir,
            anime_repo: Arc::new(SqliteAnimeRepository::new(pool.clone())),
            source_repo: Arc::new(SqliteSourceRepository::new(pool.clone())),
            episode_repo: Arc::new(SqliteEpisodeRepository::new(pool.clone())),
            comment_repo: Arc::new(SqliteCommentRepository::new(pool.clone())),
            cache_repo: Arc::new(SqliteCacheRepository::new(pool.clone())),
            config_repo: Arc::new(SqliteConfigRepository::new(pool.clone())),
            settings_repo: Arc::new(SqliteSettingsRepository::new(pool.clone())),
            task_repo: Arc::new(SqliteTaskRepository::new(pool.clone())),
            scheduled_repo: Arc::new(SqliteScheduledTaskRepository::new(pool.clone())),
            auth_repo: Arc::new(SqliteAuthRepository::new(pool.clone())),
            group_repo: Arc::new(SqliteEpisodeGroupRepository::new(pool.clone())),
            pool,
        }
    }
}

/// Builds a plain danmaku comment for fixtures
pub fn comment(cid: &str, seconds: f64, text: &str) -> DanmakuComment {
    DanmakuComment::new(cid, seconds, comment_mode::SCROLL, 16777215, "mock", text)
}

/// A scraper with canned data and switchable failure modes
pub struct MockScraper {
    pub provider: &'static str,
    pub candidates: Vec<SearchCandidate>,
    pub episodes: Vec<EpisodeListing>,
    pub comments: Vec<DanmakuComment>,
    /// When set, `get_episodes` fails with a network error
    pub fail_episodes: bool,
    /// When set, `get_comments` fails with a network error
    pub fail_comments: bool,
    pub comment_calls: AtomicUsize,
}

impl MockScraper {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            candidates: Vec::new(),
            episodes: Vec::new(),
            comments: Vec::new(),
            fail_episodes: false,
            fail_comments: false,
            comment_calls: AtomicUsize::new(0),
        }
    }

    pub fn candidate(&self, media_id: &str, title: &str, work_type: WorkType) -> SearchCandidate {
        SearchCandidate {
            provider: self.provider.to_string(),
            media_id: media_id.to_string(),
            title: title.to_string(),
            work_type,
            season: keyword_parser::season_from_title(title) as i32,
            year: Some(2020),
            image_url: None,
            episode_count: None,
            current_episode_index: None,
        }
    }

    pub fn episode(&self, episode_id: &str, title: &str, index: i32) -> EpisodeListing {
        EpisodeListing {
            provider: self.provider.to_string(),
            episode_id: episode_id.to_string(),
            title: title.to_string(),
            episode_index: index,
            url: None,
        }
    }
}

/// A metadata source answering every alias search with a fixed set
pub struct MockMetadataSource {
    pub provider: &'static str,
    pub aliases: Vec<String>,
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    async fn search_aliases(&self, _keyword: &str) -> Result<HashSet<String>, MetadataError> {
        Ok(self.aliases.iter().cloned().collect())
    }

    async fn check_status(&self) -> SourceStatus {
        SourceStatus::Configured
    }
}

#[async_trait]
impl Scraper for MockScraper {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    async fn search(&self, _keyword: &str, _hint: Option<&EpisodeHint>) -> Vec<SearchCandidate> {
        self.candidates.clone()
    }

    async fn get_episodes(
        &self,
        _media_id: &str,
        target_episode_index: Option<i32>,
        db_media_type: Option<WorkType>,
    ) -> Result<Vec<EpisodeListing>, ScraperError> {
        if self.fail_episodes {
            return Err(ScraperError::Network("mock failure".to_string()));
        }
        let mut episodes = self.episodes.clone();
        if db_media_type.map(|t| t.is_movie()).unwrap_or(false) && episodes.len() > 1 {
            episodes.truncate(1);
            episodes[0].episode_index = 1;
        }
        if let Some(target) = target_episode_index {
            episodes.retain(|e| e.episode_index == target);
        }
        Ok(episodes)
    }

    async fn get_comments(
        &self,
        _provider_episode_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<DanmakuComment>, ScraperError> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_comments {
            return Err(ScraperError::Network("mock failure".to_string()));
        }
        progress
            .report(50, "downloading")
            .await
            .map_err(|_| ScraperError::Aborted)?;
        progress
            .report(100, "done")
            .await
            .map_err(|_| ScraperError::Aborted)?;
        Ok(self.comments.clone())
    }
}
