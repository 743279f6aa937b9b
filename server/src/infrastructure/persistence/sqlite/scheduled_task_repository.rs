//! SQLite Scheduled Task Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

use crate::domain::entities::ScheduledTask;
use crate::domain::repositories::ScheduledTaskRepository;
use crate::shared::error::RepositoryError;

fn map_scheduled(row: &sqlx::sqlite::SqliteRow) -> Result<ScheduledTask, RepositoryError> {
    Ok(ScheduledTask {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        job_type: row.try_get("job_type")?,
        cron_expression: row.try_get("cron_expression")?,
        is_enabled: row.try_get("is_enabled")?,
        last_run_at: row.try_get("last_run_at")?,
        next_run_at: row.try_get("next_run_at")?,
    })
}

/// SQLite implementation of ScheduledTaskRepository
pub struct SqliteScheduledTaskRepository {
    pool: Pool<Sqlite>,
}

impl SqliteScheduledTaskRepository {
    /// Creates a new SQLite scheduled task repository
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduledTaskRepository for SqliteScheduledTaskRepository {
    async fn list(&self) -> Result<Vec<ScheduledTask>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM scheduled_tasks ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_scheduled).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ScheduledTask>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM scheduled_tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_scheduled).transpose()
    }

    async fn exists_by_type(&self, job_type: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM scheduled_tasks WHERE job_type = ?")
            .bind(job_type)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn create(&self, task: &ScheduledTask) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO scheduled_tasks \
             (id, name, job_type, cron_expression, is_enabled, last_run_at, next_run_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.name)
        .bind(&task.job_type)
        .bind(&task.cron_expression)
        .bind(task.is_enabled)
        .bind(task.last_run_at)
        .bind(task.next_run_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        name: &str,
        cron_expression: &str,
        is_enabled: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE scheduled_tasks SET name = ?, cron_expression = ?, is_enabled = ? \
             WHERE id = ?",
        )
        .bind(name)
        .bind(cron_expression)
        .bind(is_enabled)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM scheduled_tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_run_times(
        &self,
        id: &str,
        last_run_at: Option<DateTime<Utc>>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE scheduled_tasks SET last_run_at = ?, next_run_at = ? WHERE id = ?")
            .bind(last_run_at)
            .bind(next_run_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
