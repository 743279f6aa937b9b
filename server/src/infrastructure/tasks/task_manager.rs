//! Task engine
//!
//! A single-worker FIFO queue of cancellable, pausable tasks with a
//! persistent history row per task.
//!
//! State model:
//!
//! ```text
//! PENDING -> RUNNING -> (PAUSED <-> RUNNING) -> COMPLETED | FAILED
//! ```
//!
//! Cancellation is cooperative. The worker hands every task a
//! [`ProgressSink`] wired to this engine: each `report` call first parks on
//! the pause gate, then checks the abort token, then writes the history
//! row. A task that never reports progress cannot be interrupted until its
//! current await completes.

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::repositories::TaskRepository;
use crate::domain::value_objects::TaskStatus;
use crate::interfaces::progress::ProgressSink;
use crate::shared::error::{ApplicationError, TaskError};

/// How much of an error message makes it into the description column
const MAX_DESCRIPTION_LEN: usize = 500;

/// Queue capacity; submissions block (briefly) when the backlog is full
const QUEUE_CAPACITY: usize = 100;

/// The future a task runs; resolves to the success message
pub type TaskFuture = BoxFuture<'static, Result<String, TaskError>>;

/// A task body: receives the progress reporter, returns its future
pub type TaskFn = Box<dyn FnOnce(Arc<TaskProgress>) -> TaskFuture + Send>;

struct QueuedTask {
    id: String,
    run: TaskFn,
}

struct RunningTask {
    id: String,
    cancel: CancellationToken,
    pause: watch::Sender<bool>,
}

/// The progress sink handed to running tasks
pub struct TaskProgress {
    task_id: String,
    repo: Arc<dyn TaskRepository>,
    cancel: CancellationToken,
    pause: watch::Receiver<bool>,
}

#[async_trait::async_trait]
impl ProgressSink for TaskProgress {
    async fn report(&self, progress: i32, description: &str) -> Result<(), TaskError> {
        // Pause gate: a paused task blocks inside its next progress tick.
        // An abort fired while paused must still get through.
        let mut pause = self.pause.clone();
        while *pause.borrow() {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(TaskError::Aborted),
                changed = pause.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        if self.cancel.is_cancelled() {
            return Err(TaskError::Aborted);
        }

        self.repo
            .update_progress(&self.task_id, TaskStatus::Running, progress, description)
            .await?;
        Ok(())
    }
}

/// Single-worker task engine
pub struct TaskManager {
    sender: mpsc::Sender<QueuedTask>,
    receiver: Mutex<Option<mpsc::Receiver<QueuedTask>>>,
    repo: Arc<dyn TaskRepository>,
    running: Arc<Mutex<Option<RunningTask>>>,
}

impl TaskManager {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            repo,
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawns the worker loop. Call once at startup.
    pub async fn start(self: &Arc<Self>) {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .expect("task manager already started");
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                manager.run_one(task).await;
            }
        });
    }

    /// Enqueues a task: persists a PENDING history row and returns the task
    /// id immediately
    pub async fn submit(&self, title: &str, run: TaskFn) -> Result<String, ApplicationError> {
        let task_id = Uuid::new_v4().to_string();
        self.repo
            .create(&task_id, title, TaskStatus::Pending, "queued")
            .await?;

        info!(%task_id, title, "task submitted");
        self.sender
            .send(QueuedTask {
                id: task_id.clone(),
                run,
            })
            .await
            .map_err(|_| ApplicationError::Internal("task queue closed".to_string()))?;
        Ok(task_id)
    }

    async fn run_one(&self, task: QueuedTask) {
        // The row may have been deleted or force-failed while queued
        match self.repo.find_by_id(&task.id).await {
            Ok(Some(record)) if record.status == TaskStatus::Pending => {}
            Ok(_) => {
                warn!(task_id = %task.id, "skipping task no longer pending");
                return;
            }
            Err(e) => {
                error!(task_id = %task.id, "failed to load task row: {e}");
                return;
            }
        }

        let cancel = CancellationToken::new();
        let (pause_tx, pause_rx) = watch::channel(false);
        *self.running.lock().await = Some(RunningTask {
            id: task.id.clone(),
            cancel: cancel.clone(),
            pause: pause_tx,
        });

        if let Err(e) = self
            .repo
            .update_progress(&task.id, TaskStatus::Running, 0, "task started")
            .await
        {
            error!(task_id = %task.id, "failed to mark task running: {e}");
        }

        let progress = Arc::new(TaskProgress {
            task_id: task.id.clone(),
            repo: self.repo.clone(),
            cancel: cancel.clone(),
            pause: pause_rx,
        });

        let outcome = (task.run)(progress).await;
        // A force-fail may have raced the task's own completion; the flag
        // wins and the result is discarded
        let outcome = if cancel.is_cancelled() {
            Err(TaskError::Aborted)
        } else {
            outcome
        };

        let (status, description) = match outcome {
            Ok(message) => (TaskStatus::Completed, message),
            Err(TaskError::Aborted) => (TaskStatus::Failed, "aborted by user".to_string()),
            Err(e) => {
                let mut message = e.to_string();
                message.truncate(MAX_DESCRIPTION_LEN);
                (TaskStatus::Failed, message)
            }
        };
        info!(task_id = %task.id, status = %status, "task finished: {description}");

        if let Err(e) = self.repo.finalize(&task.id, status, &description).await {
            error!(task_id = %task.id, "failed to finalize task: {e}");
        }
        *self.running.lock().await = None;
    }

    /// Pauses the currently running task. Pausing a PENDING task is a
    /// conflict; pausing an unknown id is not-found.
    pub async fn pause(&self, task_id: &str) -> Result<(), ApplicationError> {
        let running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if current.id == task_id {
                let _ = current.pause.send(true);
                self.repo.set_status(task_id, TaskStatus::Paused).await?;
                return Ok(());
            }
        }
        drop(running);

        match self.repo.find_by_id(task_id).await? {
            Some(record) if record.status == TaskStatus::Pending => Err(
                ApplicationError::Conflict("cannot pause a queued task".to_string()),
            ),
            Some(_) => Err(ApplicationError::Conflict(
                "task is not running".to_string(),
            )),
            None => Err(ApplicationError::NotFound(format!("task {task_id}"))),
        }
    }

    /// Resumes a paused task
    pub async fn resume(&self, task_id: &str) -> Result<(), ApplicationError> {
        let running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if current.id == task_id {
                let _ = current.pause.send(false);
                self.repo.set_status(task_id, TaskStatus::Running).await?;
                return Ok(());
            }
        }
        Err(ApplicationError::Conflict(
            "task is not paused".to_string(),
        ))
    }

    /// Aborts a task. A running task sees the flag on its next progress
    /// tick; a queued task is failed out-of-band and skipped by the worker.
    pub async fn abort(&self, task_id: &str) -> Result<(), ApplicationError> {
        let running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if current.id == task_id {
                current.cancel.cancel();
                // Wake it if it is parked on the pause gate
                let _ = current.pause.send(false);
                return Ok(());
            }
        }
        drop(running);

        match self.repo.find_by_id(task_id).await? {
            Some(record) if record.status == TaskStatus::Pending => {
                self.repo
                    .finalize(task_id, TaskStatus::Failed, "aborted by user")
                    .await?;
                Ok(())
            }
            Some(_) => Err(ApplicationError::Conflict(
                "task already finished".to_string(),
            )),
            None => Err(ApplicationError::NotFound(format!("task {task_id}"))),
        }
    }

    /// Deletes a history row, aborting first when it is the running task.
    /// Deleting an absent row is not an error.
    pub async fn delete(&self, task_id: &str) -> Result<(), ApplicationError> {
        let is_running = {
            let running = self.running.lock().await;
            running.as_ref().map(|r| r.id == task_id).unwrap_or(false)
        };
        if is_running {
            let _ = self.abort(task_id).await;
        }
        self.repo.delete(task_id).await?;
        Ok(())
    }

    /// The id of the task currently on the worker, if any
    pub async fn running_task_id(&self) -> Option<String> {
        self.running.lock().await.as_ref().map(|r| r.id.clone())
    }
}
