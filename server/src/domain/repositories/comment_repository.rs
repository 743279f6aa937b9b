//! CommentRepository trait

use async_trait::async_trait;
use std::collections::HashSet;

use crate::domain::entities::Comment;
use crate::interfaces::scrapers::DanmakuComment;
use crate::shared::error::RepositoryError;

/// Repository for comment data access
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Bulk-inserts comments, ignoring duplicates on `(episode_id, cid)`,
    /// and bumps the episode's comment counter by the number of rows that
    /// actually landed. Returns that number.
    async fn bulk_insert(
        &self,
        episode_id: i64,
        comments: &[DanmakuComment],
    ) -> Result<usize, RepositoryError>;

    /// All comments of an episode in insertion order
    async fn fetch(&self, episode_id: i64) -> Result<Vec<Comment>, RepositoryError>;

    /// The set of upstream cids already stored for an episode
    async fn existing_cids(&self, episode_id: i64) -> Result<HashSet<String>, RepositoryError>;

    /// Deletes every comment of an episode and resets its counter to zero
    async fn clear_for_episode(&self, episode_id: i64) -> Result<(), RepositoryError>;
}
