//! ScheduledTaskRepository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::ScheduledTask;
use crate::shared::error::RepositoryError;

/// Repository for scheduled (cron-driven) tasks
#[async_trait]
pub trait ScheduledTaskRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<ScheduledTask>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ScheduledTask>, RepositoryError>;

    /// Whether any scheduled task with the given job type exists
    async fn exists_by_type(&self, job_type: &str) -> Result<bool, RepositoryError>;

    async fn create(&self, task: &ScheduledTask) -> Result<(), RepositoryError>;

    async fn update(
        &self,
        id: &str,
        name: &str,
        cron_expression: &str,
        is_enabled: bool,
    ) -> Result<bool, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Stamps the run bookkeeping columns after a timer fires
    async fn update_run_times(
        &self,
        id: &str,
        last_run_at: Option<DateTime<Utc>>,
        next_run_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;
}
