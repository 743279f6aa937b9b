//! Repository interfaces for data access

pub mod anime_repository;
pub mod auth_repository;
pub mod cache_repository;
pub mod comment_repository;
pub mod config_repository;
pub mod episode_group_repository;
pub mod episode_repository;
pub mod scheduled_task_repository;
pub mod settings_repository;
pub mod source_repository;
pub mod task_repository;

pub use anime_repository::{
    AnimeDetailsUpdate, AnimeFullDetails, AnimeRepository, EpisodeMatchRow, ExternalIds,
    LibraryEntry, MatchCandidateRow, SearchHit,
};
pub use auth_repository::AuthRepository;
pub use cache_repository::CacheRepository;
pub use comment_repository::CommentRepository;
pub use config_repository::ConfigRepository;
pub use episode_group_repository::{EpisodeGroupRepository, MappedEpisodeRow};
pub use episode_repository::{EpisodeProviderInfo, EpisodeRepository, NewEpisode};
pub use scheduled_task_repository::ScheduledTaskRepository;
pub use settings_repository::SettingsRepository;
pub use source_repository::{SourceDetails, SourceRepository};
pub use task_repository::TaskRepository;
