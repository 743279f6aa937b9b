//! Task history and scheduled task entities

use crate::domain::value_objects::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the persistent task history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    /// Task id (uuid)
    pub id: String,
    /// Human-readable title, e.g. "Import: Fate/Zero (bilibili)"
    pub title: String,
    /// Current status
    pub status: TaskStatus,
    /// Progress percentage, clamped to 0..=100
    pub progress: i32,
    /// Last progress description or final outcome message
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A cron-driven recurring submission to the task engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledTask {
    /// Scheduled task id (uuid)
    pub id: String,
    /// Display name
    pub name: String,
    /// Must resolve to a registered job type
    pub job_type: String,
    /// Standard 5-field cron expression
    pub cron_expression: String,
    pub is_enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
}
