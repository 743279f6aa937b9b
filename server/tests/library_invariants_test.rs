//! Invariants of the library data model: favorite uniqueness, deterministic
//! episode ids, comment counters, write-if-empty metadata, reassociation,
//! and reorder idempotence.

mod common;

use common::{comment, TestDb};
use danmud::domain::repositories::{ExternalIds, NewEpisode};
use danmud::domain::value_objects::WorkType;

async fn seed_anime(db: &TestDb, title: &str, season: i32) -> i64 {
    db.anime_repo
        .get_or_create(title, WorkType::TvSeries, season, None, None)
        .await
        .expect("anime")
}

async fn seed_episode(db: &TestDb, anime_id: i64, source_id: i64, index: i32) -> i64 {
    db.episode_repo
        .get_or_create(&NewEpisode {
            anime_id,
            source_id,
            episode_index: index,
            title: format!("Episode {index}"),
            source_url: None,
            provider_episode_id: format!("ep-{index}"),
        })
        .await
        .expect("episode")
}

#[tokio::test]
async fn at_most_one_favorite_source_per_anime() {
    let db = TestDb::new().await;
    let anime_id = seed_anime(&db, "Test Show", 1).await;
    let s1 = db.source_repo.link(anime_id, "bilibili", "ss1").await.unwrap();
    let s2 = db.source_repo.link(anime_id, "tencent", "cid1").await.unwrap();

    assert!(db.source_repo.toggle_favorite(s1).await.unwrap());
    assert!(db.source_repo.toggle_favorite(s2).await.unwrap());

    let sources = db.source_repo.list_for_anime(anime_id).await.unwrap();
    let favorited: Vec<_> = sources.iter().filter(|s| s.is_favorited).collect();
    assert_eq!(favorited.len(), 1);
    assert_eq!(favorited[0].id, s2);

    // Toggling off leaves no favorite at all
    assert!(!db.source_repo.toggle_favorite(s2).await.unwrap());
    let sources = db.source_repo.list_for_anime(anime_id).await.unwrap();
    assert!(sources.iter().all(|s| !s.is_favorited));
}

#[tokio::test]
async fn deterministic_episode_id_layout() {
    let db = TestDb::new().await;

    // Pin the anime id to 42 so the expected constant is readable
    sqlx::query("INSERT INTO anime (id, title, type, season, created_at) VALUES (42, 'Pinned', 'tv_series', 1, CURRENT_TIMESTAMP)")
        .execute(&db.pool)
        .await
        .unwrap();
    let s1 = db.source_repo.link(42, "bilibili", "ss42").await.unwrap();
    let s2 = db.source_repo.link(42, "tencent", "cid42").await.unwrap();

    let first = seed_episode(&db, 42, s1, 1).await;
    let second = seed_episode(&db, 42, s2, 7).await;

    assert_eq!(first, 25_000_042_010_001);
    // anime 42, second source, episode 7
    assert_eq!(second, 25_000_042_020_007);

    // Recreating the same episode yields the same id, not a new row
    let again = seed_episode(&db, 42, s2, 7).await;
    assert_eq!(again, second);
    assert_eq!(db.episode_repo.list_for_source(s2).await.unwrap().len(), 1);
}

#[tokio::test]
async fn comment_counter_tracks_inserts_and_clears() {
    let db = TestDb::new().await;
    let anime_id = seed_anime(&db, "Counter Show", 1).await;
    let source_id = db.source_repo.link(anime_id, "bilibili", "ss2").await.unwrap();
    let episode_id = seed_episode(&db, anime_id, source_id, 1).await;

    let batch = vec![comment("1", 1.0, "a"), comment("2", 2.0, "b")];
    assert_eq!(db.comment_repo.bulk_insert(episode_id, &batch).await.unwrap(), 2);

    // Duplicate cids are ignored, and the counter does not move for them
    let overlapping = vec![comment("2", 2.0, "b"), comment("3", 3.0, "c")];
    assert_eq!(
        db.comment_repo.bulk_insert(episode_id, &overlapping).await.unwrap(),
        1
    );

    let episode = db.episode_repo.find_by_id(episode_id).await.unwrap().unwrap();
    assert_eq!(episode.comment_count, 3);
    assert_eq!(db.comment_repo.fetch(episode_id).await.unwrap().len(), 3);

    db.comment_repo.clear_for_episode(episode_id).await.unwrap();
    let episode = db.episode_repo.find_by_id(episode_id).await.unwrap().unwrap();
    assert_eq!(episode.comment_count, 0);
    assert!(db.comment_repo.fetch(episode_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn metadata_write_if_empty() {
    let db = TestDb::new().await;
    let anime_id = seed_anime(&db, "Meta Show", 1).await;

    db.anime_repo
        .update_metadata_if_empty(
            anime_id,
            &ExternalIds {
                tmdb_id: Some("100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // A second import with a different id must not overwrite
    db.anime_repo
        .update_metadata_if_empty(
            anime_id,
            &ExternalIds {
                tmdb_id: Some("200".to_string()),
                imdb_id: Some("tt1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let metadata = db.anime_repo.metadata(anime_id).await.unwrap().unwrap();
    assert_eq!(metadata.tmdb_id.as_deref(), Some("100"));
    assert_eq!(metadata.imdb_id.as_deref(), Some("tt1"));
}

#[tokio::test]
async fn poster_backfilled_only_when_missing() {
    let db = TestDb::new().await;
    let anime_id = db
        .anime_repo
        .get_or_create("Poster Show", WorkType::TvSeries, 1, None, None)
        .await
        .unwrap();

    let same = db
        .anime_repo
        .get_or_create(
            "Poster Show",
            WorkType::TvSeries,
            1,
            Some("http://img/1.jpg"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(same, anime_id);

    let anime = db.anime_repo.find_by_id(anime_id).await.unwrap().unwrap();
    assert_eq!(anime.image_url.as_deref(), Some("http://img/1.jpg"));

    // Existing posters stay as they are
    db.anime_repo
        .get_or_create(
            "Poster Show",
            WorkType::TvSeries,
            1,
            Some("http://img/2.jpg"),
            None,
        )
        .await
        .unwrap();
    let anime = db.anime_repo.find_by_id(anime_id).await.unwrap().unwrap();
    assert_eq!(anime.image_url.as_deref(), Some("http://img/1.jpg"));
}

#[tokio::test]
async fn reassociation_moves_and_deletes_collisions() {
    let db = TestDb::new().await;
    let a = seed_anime(&db, "Work A", 1).await;
    let b = seed_anime(&db, "Work B", 1).await;

    // A: tencent/a (colliding) and iqiyi/b; B: tencent/a
    let x = db.source_repo.link(a, "tencent", "a").await.unwrap();
    let y = db.source_repo.link(a, "iqiyi", "b").await.unwrap();
    let z = db.source_repo.link(b, "tencent", "a").await.unwrap();

    let x_ep = seed_episode(&db, a, x, 1).await;
    db.comment_repo
        .bulk_insert(x_ep, &[comment("1", 1.0, "from X")])
        .await
        .unwrap();

    assert!(db.source_repo.reassociate(a, b).await.unwrap());

    // X collided with Z and is gone, episodes and comments included
    assert!(db.source_repo.find_by_id(x).await.unwrap().is_none());
    assert!(db.episode_repo.find_by_id(x_ep).await.unwrap().is_none());
    assert!(db.comment_repo.fetch(x_ep).await.unwrap().is_empty());

    // Y moved under B; A itself is gone
    let moved = db.source_repo.find_by_id(y).await.unwrap().unwrap();
    assert_eq!(moved.anime_id, b);
    assert!(db.anime_repo.find_by_id(a).await.unwrap().is_none());

    let b_sources = db.source_repo.list_for_anime(b).await.unwrap();
    let ids: Vec<i64> = b_sources.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![z, y]);
}

#[tokio::test]
async fn reorder_is_idempotent() {
    let db = TestDb::new().await;
    let anime_id = seed_anime(&db, "Gappy Show", 1).await;
    let source_id = db.source_repo.link(anime_id, "bilibili", "ss3").await.unwrap();

    for index in [2, 5, 9] {
        seed_episode(&db, anime_id, source_id, index).await;
    }

    let first_pass = db.episode_repo.reorder_for_source(source_id).await.unwrap();
    assert_eq!(first_pass, 3);
    let indices: Vec<i32> = db
        .episode_repo
        .list_for_source(source_id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.episode_index)
        .collect();
    assert_eq!(indices, vec![1, 2, 3]);

    // Running it again changes nothing
    let second_pass = db.episode_repo.reorder_for_source(source_id).await.unwrap();
    assert_eq!(second_pass, 0);
}

#[tokio::test]
async fn duplicate_episode_index_edit_is_rejected() {
    let db = TestDb::new().await;
    let anime_id = seed_anime(&db, "Conflict Show", 1).await;
    let source_id = db.source_repo.link(anime_id, "bilibili", "ss4").await.unwrap();
    let e1 = seed_episode(&db, anime_id, source_id, 1).await;
    seed_episode(&db, anime_id, source_id, 2).await;

    let result = db
        .episode_repo
        .update_info(e1, "renumbered", 2, None)
        .await;
    assert!(matches!(
        result,
        Err(danmud::shared::error::RepositoryError::Duplicate(_))
    ));
}

#[tokio::test]
async fn deleting_anime_cascades_everything() {
    let db = TestDb::new().await;
    let anime_id = seed_anime(&db, "Doomed Show", 1).await;
    let source_id = db.source_repo.link(anime_id, "bilibili", "ss5").await.unwrap();
    let episode_id = seed_episode(&db, anime_id, source_id, 1).await;
    db.comment_repo
        .bulk_insert(episode_id, &[comment("1", 1.0, "bye")])
        .await
        .unwrap();

    assert!(db.anime_repo.delete(anime_id).await.unwrap());
    assert!(db.source_repo.find_by_id(source_id).await.unwrap().is_none());
    assert!(db.episode_repo.find_by_id(episode_id).await.unwrap().is_none());
    assert!(db.comment_repo.fetch(episode_id).await.unwrap().is_empty());
    assert!(db.anime_repo.metadata(anime_id).await.unwrap().is_none());
}
