//! Scheduler
//!
//! Cron-driven recurring submissions to the task engine. Each enabled
//! scheduled task gets its own timer loop; firing updates the bookkeeping
//! columns and enqueues the job as a regular task, so overlapping runs
//! simply queue behind each other.

use chrono::Utc;
use croner::Cron;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::ScheduledTask;
use crate::domain::repositories::ScheduledTaskRepository;
use crate::infrastructure::tasks::task_manager::TaskManager;
use crate::interfaces::jobs::Job;
use crate::shared::error::{ApplicationError, SchedulerError};

/// Parses a cron expression, for validation at write time
pub fn validate_cron(expression: &str) -> Result<Cron, SchedulerError> {
    Cron::new(expression)
        .parse()
        .map_err(|e| SchedulerError::InvalidCron(format!("{expression}: {e}")))
}

fn next_occurrence(cron: &Cron) -> Option<chrono::DateTime<Utc>> {
    cron.find_next_occurrence(&Utc::now(), false).ok()
}

/// Cron scheduler feeding the task engine
pub struct Scheduler {
    repo: Arc<dyn ScheduledTaskRepository>,
    task_manager: Arc<TaskManager>,
    jobs: HashMap<&'static str, Arc<dyn Job>>,
    timers: Mutex<HashMap<String, CancellationToken>>,
}

impl Scheduler {
    pub fn new(
        repo: Arc<dyn ScheduledTaskRepository>,
        task_manager: Arc<TaskManager>,
        jobs: Vec<Arc<dyn Job>>,
    ) -> Self {
        Self {
            repo,
            task_manager,
            jobs: jobs.into_iter().map(|j| (j.job_type(), j)).collect(),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Registered job types with display names, for the admin UI
    pub fn available_job_types(&self) -> Vec<(String, String)> {
        self.jobs
            .values()
            .map(|j| (j.job_type().to_string(), j.job_name().to_string()))
            .collect()
    }

    /// Loads rows, seeds the built-in schedules once, and starts timers
    pub async fn start(self: &Arc<Self>) -> Result<(), ApplicationError> {
        self.seed_default_tasks().await?;

        for task in self.repo.list().await? {
            if task.is_enabled {
                self.spawn_timer(task).await;
            }
        }
        Ok(())
    }

    /// The built-in job families each get a schedule row on first boot
    async fn seed_default_tasks(&self) -> Result<(), ApplicationError> {
        let defaults = [
            ("incremental_refresh", "0 */6 * * *"),
            ("tmdb_mapping_refresh", "30 4 * * *"),
        ];
        for (job_type, cron) in defaults {
            let Some(job) = self.jobs.get(job_type) else { continue };
            if self.repo.exists_by_type(job_type).await? {
                continue;
            }
            let parsed = validate_cron(cron)?;
            let task = ScheduledTask {
                id: Uuid::new_v4().to_string(),
                name: job.job_name().to_string(),
                job_type: job_type.to_string(),
                cron_expression: cron.to_string(),
                is_enabled: true,
                last_run_at: None,
                next_run_at: next_occurrence(&parsed),
            };
            self.repo.create(&task).await?;
            info!(job_type, cron, "seeded default scheduled task");
        }
        Ok(())
    }

    /// Every scheduled task row
    pub async fn list_tasks(&self) -> Result<Vec<ScheduledTask>, ApplicationError> {
        Ok(self.repo.list().await?)
    }

    /// Creates a scheduled task and starts its timer
    pub async fn create_task(
        self: &Arc<Self>,
        name: &str,
        job_type: &str,
        cron_expression: &str,
        is_enabled: bool,
    ) -> Result<ScheduledTask, ApplicationError> {
        if !self.jobs.contains_key(job_type) {
            return Err(SchedulerError::UnknownJobType(job_type.to_string()).into());
        }
        let cron = validate_cron(cron_expression)?;

        let task = ScheduledTask {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            job_type: job_type.to_string(),
            cron_expression: cron_expression.to_string(),
            is_enabled,
            last_run_at: None,
            next_run_at: next_occurrence(&cron),
        };
        self.repo.create(&task).await?;
        if is_enabled {
            self.spawn_timer(task.clone()).await;
        }
        Ok(task)
    }

    /// Updates a scheduled task and restarts its timer
    pub async fn update_task(
        self: &Arc<Self>,
        id: &str,
        name: &str,
        cron_expression: &str,
        is_enabled: bool,
    ) -> Result<(), ApplicationError> {
        let cron = validate_cron(cron_expression)?;
        if !self.repo.update(id, name, cron_expression, is_enabled).await? {
            return Err(ApplicationError::NotFound(format!("scheduled task {id}")));
        }

        self.stop_timer(id).await;
        let next = if is_enabled { next_occurrence(&cron) } else { None };
        let last = self.repo.find_by_id(id).await?.and_then(|t| t.last_run_at);
        self.repo.update_run_times(id, last, next).await?;

        if is_enabled {
            if let Some(task) = self.repo.find_by_id(id).await? {
                self.spawn_timer(task).await;
            }
        }
        Ok(())
    }

    /// Deletes a scheduled task and stops its timer
    pub async fn delete_task(&self, id: &str) -> Result<bool, ApplicationError> {
        self.stop_timer(id).await;
        Ok(self.repo.delete(id).await?)
    }

    /// Fires a scheduled task immediately, outside its cron cadence
    pub async fn run_now(&self, id: &str) -> Result<String, ApplicationError> {
        let task = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("scheduled task {id}")))?;
        let job = self
            .jobs
            .get(task.job_type.as_str())
            .cloned()
            .ok_or_else(|| {
                ApplicationError::from(SchedulerError::UnknownJobType(task.job_type.clone()))
            })?;

        self.repo
            .update_run_times(id, Some(Utc::now()), task.next_run_at)
            .await?;
        self.submit_job(job).await
    }

    async fn submit_job(&self, job: Arc<dyn Job>) -> Result<String, ApplicationError> {
        let title = format!("Scheduled: {}", job.job_name());
        self.task_manager
            .submit(
                &title,
                Box::new(move |progress| {
                    Box::pin(async move { job.run(progress.as_ref()).await })
                }),
            )
            .await
    }

    async fn spawn_timer(self: &Arc<Self>, task: ScheduledTask) {
        let cancel = CancellationToken::new();
        self.timers
            .lock()
            .await
            .insert(task.id.clone(), cancel.clone());

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let cron = match validate_cron(&task.cron_expression) {
                Ok(cron) => cron,
                Err(e) => {
                    error!(task = %task.name, "bad cron expression: {e}");
                    return;
                }
            };

            loop {
                let Some(next) = next_occurrence(&cron) else {
                    warn!(task = %task.name, "cron has no future occurrence");
                    return;
                };
                if let Err(e) = scheduler
                    .repo
                    .update_run_times(&task.id, task.last_run_at, Some(next))
                    .await
                {
                    error!(task = %task.name, "failed to store next run time: {e}");
                }

                let wait = (next - Utc::now())
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(wait) => {}
                }

                let now = Utc::now();
                let upcoming = next_occurrence(&cron);
                if let Err(e) = scheduler
                    .repo
                    .update_run_times(&task.id, Some(now), upcoming)
                    .await
                {
                    error!(task = %task.name, "failed to store run times: {e}");
                }

                if let Some(job) = scheduler.jobs.get(task.job_type.as_str()).cloned() {
                    if let Err(e) = scheduler.submit_job(job).await {
                        error!(task = %task.name, "failed to submit scheduled job: {e}");
                    }
                } else {
                    error!(task = %task.name, job_type = %task.job_type, "unknown job type");
                }
            }
        });
    }

    async fn stop_timer(&self, id: &str) {
        if let Some(cancel) = self.timers.lock().await.remove(id) {
            cancel.cancel();
        }
    }
}
