//! Task engine behavior: the state model, cooperative pause/abort, crash
//! recovery, and queue semantics.

mod common;

use common::TestDb;
use std::sync::Arc;
use std::time::Duration;

use danmud::domain::value_objects::TaskStatus;
use danmud::infrastructure::tasks::TaskManager;
use danmud::interfaces::progress::ProgressSink;
use danmud::shared::error::TaskError;

async fn wait_for_status(
    db: &TestDb,
    task_id: &str,
    expected: TaskStatus,
) -> danmud::domain::entities::TaskRecord {
    for _ in 0..100 {
        if let Some(record) = db.task_repo.find_by_id(task_id).await.unwrap() {
            if record.status == expected {
                return record;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {task_id} never reached {expected:?}");
}

#[tokio::test]
async fn successful_task_completes_with_message() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    let task_id = manager
        .submit(
            "quick task",
            Box::new(|progress| {
                Box::pin(async move {
                    progress.report(50, "halfway").await?;
                    Ok("all done".to_string())
                })
            }),
        )
        .await
        .unwrap();

    let record = wait_for_status(&db, &task_id, TaskStatus::Completed).await;
    assert_eq!(record.description, "all done");
    assert_eq!(record.progress, 100);
    assert!(record.finished_at.is_some());
}

#[tokio::test]
async fn failing_task_records_the_error() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    let task_id = manager
        .submit(
            "doomed task",
            Box::new(|_progress| {
                Box::pin(async move { Err(TaskError::Failed("upstream exploded".to_string())) })
            }),
        )
        .await
        .unwrap();

    let record = wait_for_status(&db, &task_id, TaskStatus::Failed).await;
    assert!(record.description.contains("upstream exploded"));
    assert!(record.finished_at.is_some());
}

#[tokio::test]
async fn abort_interrupts_at_the_next_progress_tick() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    let task_id = manager
        .submit(
            "long task",
            Box::new(|progress| {
                Box::pin(async move {
                    for i in 0..1000 {
                        progress.report(i % 100, "ticking").await?;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    Ok("never reached".to_string())
                })
            }),
        )
        .await
        .unwrap();

    wait_for_status(&db, &task_id, TaskStatus::Running).await;
    // Let a couple of ticks through before pulling the plug
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.abort(&task_id).await.unwrap();

    let record = wait_for_status(&db, &task_id, TaskStatus::Failed).await;
    assert!(record.description.contains("aborted"));
}

#[tokio::test]
async fn pause_blocks_progress_until_resume() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    let task_id = manager
        .submit(
            "pausable task",
            Box::new(|progress| {
                Box::pin(async move {
                    for i in 1..=20 {
                        progress.report(i * 5, "working").await?;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    Ok("walked the whole way".to_string())
                })
            }),
        )
        .await
        .unwrap();

    wait_for_status(&db, &task_id, TaskStatus::Running).await;
    manager.pause(&task_id).await.unwrap();
    wait_for_status(&db, &task_id, TaskStatus::Paused).await;

    // While paused the progress column freezes
    let frozen = db.task_repo.find_by_id(&task_id).await.unwrap().unwrap().progress;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let still = db.task_repo.find_by_id(&task_id).await.unwrap().unwrap();
    assert_eq!(still.status, TaskStatus::Paused);
    assert_eq!(still.progress, frozen);

    manager.resume(&task_id).await.unwrap();
    let record = wait_for_status(&db, &task_id, TaskStatus::Completed).await;
    assert_eq!(record.description, "walked the whole way");
}

#[tokio::test]
async fn pausing_a_queued_task_is_a_conflict() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    // Occupy the worker so the second task stays PENDING
    let _blocker = manager
        .submit(
            "blocker",
            Box::new(|_progress| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok("done".to_string())
                })
            }),
        )
        .await
        .unwrap();
    let queued = manager
        .submit(
            "queued",
            Box::new(|_progress| Box::pin(async move { Ok("done".to_string()) })),
        )
        .await
        .unwrap();

    let result = manager.pause(&queued).await;
    assert!(matches!(
        result,
        Err(danmud::shared::error::ApplicationError::Conflict(_))
    ));
}

#[tokio::test]
async fn aborting_a_queued_task_fails_it_before_it_runs() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    let _blocker = manager
        .submit(
            "blocker",
            Box::new(|_progress| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    Ok("done".to_string())
                })
            }),
        )
        .await
        .unwrap();
    let queued = manager
        .submit(
            "queued victim",
            Box::new(|_progress| Box::pin(async move { Ok("should not run".to_string()) })),
        )
        .await
        .unwrap();

    manager.abort(&queued).await.unwrap();
    let record = wait_for_status(&db, &queued, TaskStatus::Failed).await;
    assert!(record.description.contains("aborted"));

    // The worker skips it; the row never flips to COMPLETED
    tokio::time::sleep(Duration::from_millis(500)).await;
    let record = db.task_repo.find_by_id(&queued).await.unwrap().unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
}

#[tokio::test]
async fn delete_is_idempotent_and_aborts_running_tasks() {
    let db = TestDb::new().await;
    let manager = Arc::new(TaskManager::new(db.task_repo.clone()));
    manager.start().await;

    let task_id = manager
        .submit(
            "deletable",
            Box::new(|progress| {
                Box::pin(async move {
                    loop {
                        progress.report(10, "spinning").await?;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                })
            }),
        )
        .await
        .unwrap();

    wait_for_status(&db, &task_id, TaskStatus::Running).await;
    manager.delete(&task_id).await.unwrap();
    // Deleting a row that is already gone is fine
    manager.delete(&task_id).await.unwrap();
    assert!(db.task_repo.find_by_id(&task_id).await.unwrap().is_none());
}

#[tokio::test]
async fn crash_recovery_fails_interrupted_rows() {
    let db = TestDb::new().await;

    db.task_repo
        .create("dead-1", "interrupted import", TaskStatus::Pending, "queued")
        .await
        .unwrap();
    db.task_repo
        .update_progress("dead-1", TaskStatus::Running, 42, "was working")
        .await
        .unwrap();
    db.task_repo
        .create("dead-2", "interrupted paused", TaskStatus::Pending, "queued")
        .await
        .unwrap();
    db.task_repo
        .set_status("dead-2", TaskStatus::Paused)
        .await
        .unwrap();
    db.task_repo
        .create("alive", "already done", TaskStatus::Pending, "queued")
        .await
        .unwrap();
    db.task_repo
        .finalize("alive", TaskStatus::Completed, "finished cleanly")
        .await
        .unwrap();

    assert_eq!(db.task_repo.mark_interrupted().await.unwrap(), 2);

    for id in ["dead-1", "dead-2"] {
        let record = db.task_repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.description, "interrupted by restart");
        assert!(record.finished_at.is_some());
    }
    let record = db.task_repo.find_by_id("alive").await.unwrap().unwrap();
    assert_eq!(record.description, "finished cleanly");
}
