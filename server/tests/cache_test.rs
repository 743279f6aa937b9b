//! Cache layer behavior: TTL visibility, disabled caching, and sweeps.

mod common;

use common::TestDb;

#[tokio::test]
async fn set_then_get_within_ttl() {
    let db = TestDb::new().await;
    db.cache_repo
        .set("search_mock_frieren", "[\"hit\"]", 300, Some("mock"))
        .await
        .unwrap();

    let value = db.cache_repo.get("search_mock_frieren").await.unwrap();
    assert_eq!(value.as_deref(), Some("[\"hit\"]"));
}

#[tokio::test]
async fn expired_entries_are_invisible_but_not_removed() {
    let db = TestDb::new().await;
    db.cache_repo
        .set("episodes_ss1", "[]", 60, Some("mock"))
        .await
        .unwrap();

    // Push the expiry into the past behind the repository's back
    sqlx::query("UPDATE cache SET expires_at = ? WHERE cache_key = ?")
        .bind(chrono::Utc::now() - chrono::Duration::hours(1))
        .bind("episodes_ss1")
        .execute(&db.pool)
        .await
        .unwrap();

    assert!(db.cache_repo.get("episodes_ss1").await.unwrap().is_none());

    // The row is still physically there until the sweep runs
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    assert_eq!(db.cache_repo.clear_expired().await.unwrap(), 1);
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn zero_ttl_disables_caching() {
    let db = TestDb::new().await;
    db.cache_repo
        .set("search_mock_nothing", "value", 0, Some("mock"))
        .await
        .unwrap();
    assert!(db.cache_repo.get("search_mock_nothing").await.unwrap().is_none());

    db.cache_repo
        .set("search_mock_negative", "value", -5, Some("mock"))
        .await
        .unwrap();
    assert!(db
        .cache_repo
        .get("search_mock_negative")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn clear_all_reports_removed_rows() {
    let db = TestDb::new().await;
    db.cache_repo.set("a", "1", 300, None).await.unwrap();
    db.cache_repo.set("b", "2", 300, None).await.unwrap();

    assert_eq!(db.cache_repo.clear_all().await.unwrap(), 2);
    assert!(db.cache_repo.get("a").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_replaces_value_and_ttl() {
    let db = TestDb::new().await;
    db.cache_repo.set("key", "old", 300, None).await.unwrap();
    db.cache_repo.set("key", "new", 600, None).await.unwrap();
    assert_eq!(db.cache_repo.get("key").await.unwrap().as_deref(), Some("new"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
