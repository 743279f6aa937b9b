//! SQLite Task Repository Implementation
//!
//! The persistent half of the task engine: every state transition the
//! worker makes lands here.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::domain::entities::TaskRecord;
use crate::domain::repositories::TaskRepository;
use crate::domain::value_objects::TaskStatus;
use crate::shared::error::RepositoryError;

fn map_task(row: &sqlx::sqlite::SqliteRow) -> Result<TaskRecord, RepositoryError> {
    let status_str: String = row.try_get("status")?;
    Ok(TaskRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        status: TaskStatus::from_str(&status_str).map_err(RepositoryError::Domain)?,
        progress: row.try_get("progress")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}

/// SQLite implementation of TaskRepository
pub struct SqliteTaskRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTaskRepository {
    /// Creates a new SQLite task repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(
        &self,
        task_id: &str,
        title: &str,
        status: TaskStatus,
        description: &str,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO task_history (id, title, status, progress, description, created_at, updated_at) \
             VALUES (?, ?, ?, 0, ?, ?, ?)",
        )
        .bind(task_id)
        .bind(title)
        .bind(status.as_str())
        .bind(description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_progress(
        &self,
        task_id: &str,
        status: TaskStatus,
        progress: i32,
        description: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE task_history SET status = ?, progress = ?, description = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(progress.clamp(0, 100))
        .bind(description)
        .bind(Utc::now())
        .bind(task_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn finalize(
        &self,
        task_id: &str,
        status: TaskStatus,
        description: &str,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let progress = if status == TaskStatus::Completed { 100 } else { -1 };
        // -1 means keep the current progress column
        if progress >= 0 {
            sqlx::query(
                "UPDATE task_history SET status = ?, progress = ?, description = ?, \
                 updated_at = ?, finished_at = ? WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(progress)
            .bind(description)
            .bind(now)
            .bind(now)
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "UPDATE task_history SET status = ?, description = ?, \
                 updated_at = ?, finished_at = ? WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(description)
            .bind(now)
            .bind(now)
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE task_history SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(
        &self,
        search_term: Option<&str>,
        status_filter: &str,
    ) -> Result<Vec<TaskRecord>, RepositoryError> {
        let mut conditions = Vec::new();
        match status_filter {
            "in_progress" => conditions.push("status IN ('PENDING', 'RUNNING', 'PAUSED')"),
            "completed" => conditions.push("status IN ('COMPLETED', 'FAILED')"),
            _ => {}
        }
        if search_term.is_some() {
            conditions.push("title LIKE ?");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT * FROM task_history {where_clause} ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(term) = search_term {
            query = query.bind(format!("%{term}%"));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(map_task).collect()
    }

    async fn find_by_id(&self, task_id: &str) -> Result<Option<TaskRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM task_history WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_task).transpose()
    }

    async fn delete(&self, task_id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM task_history WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_interrupted(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE task_history SET status = 'FAILED', description = 'interrupted by restart', \
             updated_at = ?, finished_at = ? WHERE status IN ('RUNNING', 'PAUSED')",
        )
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as usize)
    }
}
