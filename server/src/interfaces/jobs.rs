//! Scheduled job contract
//!
//! A job is a reusable task body with a stable type key; the scheduler
//! resolves `scheduled_tasks.job_type` against the registered set and
//! submits `run` to the task engine.

use async_trait::async_trait;

use crate::interfaces::progress::ProgressSink;
use crate::shared::error::TaskError;

/// A recurring job the scheduler can submit to the task engine
#[async_trait]
pub trait Job: Send + Sync {
    /// Unique key stored in `scheduled_tasks.job_type`
    fn job_type(&self) -> &'static str;

    /// Default display name
    fn job_name(&self) -> &'static str;

    /// The job body; must be safe to run again while a previous submission
    /// is still queued
    async fn run(&self, progress: &dyn ProgressSink) -> Result<String, TaskError>;
}
