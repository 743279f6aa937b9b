//! SQLite Comment Repository Implementation
//!
//! Comments are append-only: bulk inserts ignore duplicates on the natural
//! key, and the parent episode's denormalized counter moves with them.

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;

use crate::domain::entities::Comment;
use crate::domain::repositories::CommentRepository;
use crate::interfaces::scrapers::DanmakuComment;
use crate::shared::error::RepositoryError;

/// SQLite implementation of CommentRepository
pub struct SqliteCommentRepository {
    pool: Pool<Sqlite>,
}

impl SqliteCommentRepository {
    /// Creates a new SQLite comment repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn bulk_insert(
        &self,
        episode_id: i64,
        comments: &[DanmakuComment],
    ) -> Result<usize, RepositoryError> {
        if comments.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for comment in comments {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO comment (episode_id, cid, p, m, t) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(episode_id)
            .bind(&comment.cid)
            .bind(&comment.p)
            .bind(&comment.m)
            .bind(comment.t)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected() as usize;
        }

        if inserted > 0 {
            sqlx::query("UPDATE episode SET comment_count = comment_count + ? WHERE id = ?")
                .bind(inserted as i64)
                .bind(episode_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn fetch(&self, episode_id: i64) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM comment WHERE episode_id = ? ORDER BY id ASC")
            .bind(episode_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Comment {
                    id: row.try_get("id")?,
                    episode_id: row.try_get("episode_id")?,
                    cid: row.try_get("cid")?,
                    p: row.try_get("p")?,
                    m: row.try_get("m")?,
                    t: row.try_get("t")?,
                })
            })
            .collect()
    }

    async fn existing_cids(&self, episode_id: i64) -> Result<HashSet<String>, RepositoryError> {
        let rows = sqlx::query("SELECT cid FROM comment WHERE episode_id = ?")
            .bind(episode_id)
            .fetch_all(&self.pool)
            .await?;

        let mut cids = HashSet::with_capacity(rows.len());
        for row in rows {
            cids.insert(row.try_get("cid")?);
        }
        Ok(cids)
    }

    async fn clear_for_episode(&self, episode_id: i64) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comment WHERE episode_id = ?")
            .bind(episode_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE episode SET comment_count = 0 WHERE id = ?")
            .bind(episode_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
