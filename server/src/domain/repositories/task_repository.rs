//! TaskRepository trait
//!
//! Persistence for the task history rows the engine keeps in step with its
//! in-memory state.

use async_trait::async_trait;

use crate::domain::entities::TaskRecord;
use crate::domain::value_objects::TaskStatus;
use crate::shared::error::RepositoryError;

/// Repository for task history
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a fresh history row
    async fn create(
        &self,
        task_id: &str,
        title: &str,
        status: TaskStatus,
        description: &str,
    ) -> Result<(), RepositoryError>;

    /// Updates status/progress/description on a progress tick
    async fn update_progress(
        &self,
        task_id: &str,
        status: TaskStatus,
        progress: i32,
        description: &str,
    ) -> Result<(), RepositoryError>;

    /// Writes the terminal status, final description, and `finished_at`
    async fn finalize(
        &self,
        task_id: &str,
        status: TaskStatus,
        description: &str,
    ) -> Result<(), RepositoryError>;

    /// Sets the status column only (pause/resume bookkeeping)
    async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<(), RepositoryError>;

    /// Lists history rows, optionally filtered by a title search term and a
    /// status filter ("all", "in_progress", "completed")
    async fn list(
        &self,
        search_term: Option<&str>,
        status_filter: &str,
    ) -> Result<Vec<TaskRecord>, RepositoryError>;

    /// One history row
    async fn find_by_id(&self, task_id: &str) -> Result<Option<TaskRecord>, RepositoryError>;

    /// Deletes a history row; deleting an absent row is not an error
    async fn delete(&self, task_id: &str) -> Result<bool, RepositoryError>;

    /// Startup reconciliation: every row still RUNNING or PAUSED becomes
    /// FAILED("interrupted by restart") with `finished_at` set. Returns the
    /// number of rows touched.
    async fn mark_interrupted(&self) -> Result<usize, RepositoryError>;
}
