//! TaskStatus value object
//!
//! State model of a task in the single-worker engine:
//!
//! ```text
//! PENDING -> RUNNING -> (PAUSED <-> RUNNING) -> COMPLETED | FAILED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task status enum, stored verbatim in the `task_history` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Queued, not yet picked up by the worker
    Pending,
    /// Currently executing (at most one task at a time)
    Running,
    /// Blocked inside its next progress tick
    Paused,
    /// Finished successfully
    Completed,
    /// Finished with an error, or aborted
    Failed,
}

impl TaskStatus {
    /// Returns the string representation stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Paused => "PAUSED",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        }
    }

    /// True once the task can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = crate::shared::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "RUNNING" => Ok(TaskStatus::Running),
            "PAUSED" => Ok(TaskStatus::Paused),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            other => Err(crate::shared::error::DomainError::ParseError(format!(
                "unknown task status: {other}"
            ))),
        }
    }
}
