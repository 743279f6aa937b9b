//! Scheduler behavior: job registration, cron validation, run-now, and the
//! seeded built-in schedules.

mod common;

use async_trait::async_trait;
use common::TestDb;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use danmud::domain::value_objects::TaskStatus;
use danmud::infrastructure::tasks::{validate_cron, Scheduler, TaskManager};
use danmud::interfaces::jobs::Job;
use danmud::interfaces::progress::ProgressSink;
use danmud::shared::error::TaskError;

struct CountingJob {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Job for CountingJob {
    fn job_type(&self) -> &'static str {
        "counting"
    }

    fn job_name(&self) -> &'static str {
        "Counting job"
    }

    async fn run(&self, progress: &dyn ProgressSink) -> Result<String, TaskError> {
        progress.report(50, "counting").await?;
        let count = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("ran {count} times"))
    }
}

async fn build_scheduler(db: &TestDb, runs: Arc<AtomicUsize>) -> Arc<Scheduler> {
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;
    Arc::new(Scheduler::new(
        db.scheduled_repo.clone(),
        manager,
        vec![Arc::new(CountingJob { runs })],
    ))
}

#[tokio::test]
async fn cron_expressions_are_validated() {
    assert!(validate_cron("0 */6 * * *").is_ok());
    assert!(validate_cron("not a cron").is_err());
}

#[tokio::test]
async fn unknown_job_types_are_rejected() {
    let db = TestDb::new().await;
    let scheduler = build_scheduler(&db, Arc::new(AtomicUsize::new(0))).await;

    let result = scheduler
        .create_task("mystery", "no_such_job", "0 * * * *", true)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn bad_cron_is_rejected_at_write_time() {
    let db = TestDb::new().await;
    let scheduler = build_scheduler(&db, Arc::new(AtomicUsize::new(0))).await;

    let result = scheduler
        .create_task("broken", "counting", "99 99 * * *", true)
        .await;
    assert!(result.is_err());
    assert!(db.scheduled_repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn created_tasks_carry_a_next_run_time() {
    let db = TestDb::new().await;
    let scheduler = build_scheduler(&db, Arc::new(AtomicUsize::new(0))).await;

    let task = scheduler
        .create_task("hourly count", "counting", "0 * * * *", true)
        .await
        .unwrap();
    assert!(task.next_run_at.is_some());

    let stored = db
        .scheduled_repo
        .find_by_id(&task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.job_type, "counting");
    assert_eq!(stored.cron_expression, "0 * * * *");
}

#[tokio::test]
async fn run_now_submits_the_job_to_the_engine() {
    let db = TestDb::new().await;
    let runs = Arc::new(AtomicUsize::new(0));
    let scheduler = build_scheduler(&db, runs.clone()).await;

    let task = scheduler
        .create_task("on demand", "counting", "0 3 * * *", false)
        .await
        .unwrap();
    let task_id = scheduler.run_now(&task.id).await.unwrap();

    // Wait for the engine to drain it
    for _ in 0..100 {
        if let Some(record) = db.task_repo.find_by_id(&task_id).await.unwrap() {
            if record.status == TaskStatus::Completed {
                assert_eq!(record.description, "ran 1 times");
                assert_eq!(runs.load(Ordering::SeqCst), 1);
                let refreshed = db
                    .scheduled_repo
                    .find_by_id(&task.id)
                    .await
                    .unwrap()
                    .unwrap();
                assert!(refreshed.last_run_at.is_some());
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("run-now task never completed");
}

#[tokio::test]
async fn update_reschedules_and_delete_removes() {
    let db = TestDb::new().await;
    let scheduler = build_scheduler(&db, Arc::new(AtomicUsize::new(0))).await;

    let task = scheduler
        .create_task("mutable", "counting", "0 * * * *", true)
        .await
        .unwrap();

    scheduler
        .update_task(&task.id, "mutable", "30 2 * * *", false)
        .await
        .unwrap();
    let stored = db
        .scheduled_repo
        .find_by_id(&task.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.cron_expression, "30 2 * * *");
    assert!(!stored.is_enabled);
    assert!(stored.next_run_at.is_none());

    assert!(scheduler.delete_task(&task.id).await.unwrap());
    assert!(db.scheduled_repo.find_by_id(&task.id).await.unwrap().is_none());
}
