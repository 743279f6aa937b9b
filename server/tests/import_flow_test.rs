//! Import and refresh flows: idempotence, abort-before-write, full-refresh
//! clearing semantics, and the single-episode delta refresh.

mod common;

use common::{comment, MockScraper, TestDb};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use danmud::application::use_cases::{ImportRequest, ImportUseCase, RefreshUseCase};
use danmud::domain::repositories::{ExternalIds, NewEpisode};
use danmud::domain::value_objects::WorkType;
use danmud::infrastructure::scrapers::ScraperRegistry;
use danmud::interfaces::progress::{NoopProgress, ProgressSink};
use danmud::interfaces::scrapers::Scraper;
use danmud::shared::error::TaskError;

fn import_request(provider: &str, media_id: &str, title: &str) -> ImportRequest {
    ImportRequest {
        provider: provider.to_string(),
        media_id: media_id.to_string(),
        anime_title: title.to_string(),
        work_type: WorkType::TvSeries,
        season: 1,
        current_episode_index: None,
        image_url: None,
        external_ids: ExternalIds::default(),
    }
}

async fn build_import(
    db: &TestDb,
    scraper: Arc<dyn Scraper>,
) -> (Arc<ImportUseCase>, Arc<RefreshUseCase>) {
    let registry = Arc::new(
        ScraperRegistry::initialize(vec![scraper], db.settings_repo.clone())
            .await
            .unwrap(),
    );
    let import = Arc::new(ImportUseCase::new(
        registry.clone(),
        db.anime_repo.clone(),
        db.source_repo.clone(),
        db.episode_repo.clone(),
        db.comment_repo.clone(),
    ));
    let refresh = Arc::new(RefreshUseCase::new(
        registry,
        db.source_repo.clone(),
        db.episode_repo.clone(),
        db.comment_repo.clone(),
        import.clone(),
    ));
    (import, refresh)
}

fn stocked_scraper() -> MockScraper {
    let mut scraper = MockScraper::new("mock");
    scraper.episodes = vec![
        scraper.episode("v1", "Episode 1", 1),
        scraper.episode("v2", "Episode 2", 2),
    ];
    scraper.comments = vec![comment("c1", 1.0, "first"), comment("c2", 2.0, "second")];
    scraper
}

#[tokio::test]
async fn import_stores_episodes_and_comments() {
    let db = TestDb::new().await;
    let (import, _) = build_import(&db, Arc::new(stocked_scraper())).await;

    let message = import
        .execute(&import_request("mock", "m1", "Test: Show"), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(message, "imported 4 new comments");

    // The title lands with the colon folded
    let details = db
        .anime_repo
        .full_details(1)
        .await
        .unwrap()
        .expect("anime stored");
    assert_eq!(details.anime.title, "Test： Show");

    let sources = db.source_repo.list_for_anime(1).await.unwrap();
    assert_eq!(sources.len(), 1);
    let episodes = db.episode_repo.list_for_source(sources[0].id).await.unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0].comment_count, 2);
}

#[tokio::test]
async fn importing_twice_changes_nothing() {
    let db = TestDb::new().await;
    let (import, _) = build_import(&db, Arc::new(stocked_scraper())).await;
    let request = import_request("mock", "m1", "Stable Show");

    import.execute(&request, &NoopProgress).await.unwrap();
    let message = import.execute(&request, &NoopProgress).await.unwrap();
    // Same upstream data: every insert is a duplicate
    assert_eq!(message, "imported 0 new comments");

    let sources = db.source_repo.list_for_anime(1).await.unwrap();
    assert_eq!(sources.len(), 1);
    let episodes = db.episode_repo.list_for_source(sources[0].id).await.unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0].comment_count, 2);
    assert_eq!(episodes[1].comment_count, 2);
}

#[tokio::test]
async fn movie_imports_keep_only_the_first_entry() {
    let db = TestDb::new().await;
    let mut scraper = stocked_scraper();
    scraper.comments = vec![comment("c1", 1.0, "only")];
    let (import, _) = build_import(&db, Arc::new(scraper)).await;

    let mut request = import_request("mock", "movie1", "Some Movie");
    request.work_type = WorkType::Movie;
    import.execute(&request, &NoopProgress).await.unwrap();

    let sources = db.source_repo.list_for_anime(1).await.unwrap();
    let episodes = db.episode_repo.list_for_source(sources[0].id).await.unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].episode_index, 1);
}

#[tokio::test]
async fn failed_episode_listing_leaves_database_untouched() {
    let db = TestDb::new().await;
    let mut scraper = stocked_scraper();
    scraper.fail_episodes = true;
    let (import, _) = build_import(&db, Arc::new(scraper)).await;

    let result = import
        .execute(&import_request("mock", "m1", "Doomed Show"), &NoopProgress)
        .await;
    assert!(result.is_err());
    assert!(db.anime_repo.list_library().await.unwrap().is_empty());
}

/// A progress sink that aborts after a fixed number of reports
struct AbortAfter {
    remaining: AtomicUsize,
}

#[async_trait]
impl ProgressSink for AbortAfter {
    async fn report(&self, _progress: i32, _description: &str) -> Result<(), TaskError> {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 0 {
            return Err(TaskError::Aborted);
        }
        Ok(())
    }
}

#[tokio::test]
async fn abort_during_comment_fetch_leaves_database_untouched() {
    let db = TestDb::new().await;
    let (import, _) = build_import(&db, Arc::new(stocked_scraper())).await;

    // Enough ticks to get past the episode listing, not past the comments
    let progress = AbortAfter {
        remaining: AtomicUsize::new(3),
    };
    let result = import
        .execute(&import_request("mock", "m1", "Aborted Show"), &progress)
        .await;
    assert_matches::assert_matches!(result, Err(TaskError::Aborted));

    assert!(db.anime_repo.list_library().await.unwrap().is_empty());
    let orphan_comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(orphan_comments, 0);
}

#[tokio::test]
async fn full_refresh_clears_before_reimporting() {
    let db = TestDb::new().await;
    let (import, refresh) = build_import(&db, Arc::new(stocked_scraper())).await;

    import
        .execute(&import_request("mock", "m1", "Refreshed Show"), &NoopProgress)
        .await
        .unwrap();
    let source_id = db.source_repo.list_for_anime(1).await.unwrap()[0].id;

    // Leave a stale extra episode behind; the refresh must wipe it
    db.episode_repo
        .get_or_create(&NewEpisode {
            anime_id: 1,
            source_id,
            episode_index: 99,
            title: "stale".to_string(),
            source_url: None,
            provider_episode_id: "stale".to_string(),
        })
        .await
        .unwrap();

    refresh.full_refresh(source_id, &NoopProgress).await.unwrap();

    let episodes = db.episode_repo.list_for_source(source_id).await.unwrap();
    let indices: Vec<i32> = episodes.iter().map(|e| e.episode_index).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[tokio::test]
async fn full_refresh_failure_after_clearing_leaves_source_empty() {
    let db = TestDb::new().await;

    // Import through a healthy scraper first
    let (import, _) = build_import(&db, Arc::new(stocked_scraper())).await;
    import
        .execute(&import_request("mock", "m1", "Fragile Show"), &NoopProgress)
        .await
        .unwrap();
    let source_id = db.source_repo.list_for_anime(1).await.unwrap()[0].id;

    // Rebuild the stack with a scraper that fails after clearing ran
    let mut broken = stocked_scraper();
    broken.fail_episodes = true;
    let (_, refresh) = build_import(&db, Arc::new(broken)).await;

    let result = refresh.full_refresh(source_id, &NoopProgress).await;
    assert!(result.is_err());

    // The clear succeeded, the re-import never reached its write phase
    assert!(db.episode_repo.list_for_source(source_id).await.unwrap().is_empty());
    assert!(db.source_repo.find_by_id(source_id).await.unwrap().is_some());
}

#[tokio::test]
async fn episode_refresh_inserts_only_the_delta() {
    let db = TestDb::new().await;
    let scraper = Arc::new(stocked_scraper());
    let (import, refresh) = build_import(&db, scraper.clone()).await;

    import
        .execute(&import_request("mock", "m1", "Delta Show"), &NoopProgress)
        .await
        .unwrap();
    let source_id = db.source_repo.list_for_anime(1).await.unwrap()[0].id;
    let episode_id = db.episode_repo.list_for_source(source_id).await.unwrap()[0].id;

    // Nothing new upstream: the delta is empty
    let message = refresh
        .refresh_episode(episode_id, &NoopProgress)
        .await
        .unwrap();
    assert_eq!(message, "refresh finished, no new comments");

    let episode = db.episode_repo.find_by_id(episode_id).await.unwrap().unwrap();
    assert_eq!(episode.comment_count, 2);
    assert!(episode.fetched_at.is_some());
}
