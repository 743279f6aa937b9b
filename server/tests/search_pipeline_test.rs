//! Search pipeline behavior: keyword parsing end to end, alias filtering,
//! movie-type correction, season filtering, episode echo, and ordering.

mod common;

use common::{MockMetadataSource, MockScraper, TestDb};
use std::sync::Arc;

use danmud::application::services::MetadataSourceManager;
use danmud::application::use_cases::SearchProviderUseCase;
use danmud::domain::value_objects::WorkType;
use danmud::infrastructure::scrapers::ScraperRegistry;
use danmud::interfaces::metadata::MetadataSource;
use danmud::interfaces::scrapers::Scraper;

async fn build_pipeline(
    db: &TestDb,
    scrapers: Vec<Arc<dyn Scraper>>,
    aliases: Vec<String>,
) -> SearchProviderUseCase {
    let registry = Arc::new(
        ScraperRegistry::initialize(scrapers, db.settings_repo.clone())
            .await
            .unwrap(),
    );
    // The mock answers as "tmdb" so its aux-search flag defaults on
    let sources: Vec<Arc<dyn MetadataSource>> = if aliases.is_empty() {
        Vec::new()
    } else {
        vec![Arc::new(MockMetadataSource {
            provider: "tmdb",
            aliases,
        })]
    };
    let manager = Arc::new(
        MetadataSourceManager::initialize(sources, db.settings_repo.clone())
            .await
            .unwrap(),
    );
    SearchProviderUseCase::new(registry, manager)
}

#[tokio::test]
async fn season_and_episode_flow_through_the_pipeline() {
    let db = TestDb::new().await;

    let mut scraper = MockScraper::new("mock");
    scraper.candidates = vec![
        scraper.candidate("m1", "Fate/Zero", WorkType::TvSeries),
        scraper.candidate("m2", "Fate/Zero 第二季", WorkType::TvSeries),
        scraper.candidate("m3", "Fate/Zero 剧场版", WorkType::Movie),
    ];

    let pipeline = build_pipeline(&db, vec![Arc::new(scraper)], Vec::new()).await;
    let outcome = pipeline.execute("Fate/Zero 第二季 S2E3").await.unwrap();

    assert_eq!(outcome.search_season, Some(2));
    assert_eq!(outcome.search_episode, Some(3));

    // Only the season-2 series survives, and it echoes the episode
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].media_id, "m2");
    assert_eq!(outcome.results[0].season, 2);
    assert_eq!(outcome.results[0].current_episode_index, Some(3));
}

#[tokio::test]
async fn theatrical_cuts_are_rewritten_to_movies() {
    let db = TestDb::new().await;

    let mut scraper = MockScraper::new("mock");
    scraper.candidates = vec![
        scraper.candidate("m1", "名侦探柯南：黑铁的鱼影 劇場版", WorkType::TvSeries),
        scraper.candidate("m2", "名侦探柯南", WorkType::TvSeries),
    ];

    let pipeline = build_pipeline(&db, vec![Arc::new(scraper)], Vec::new()).await;
    let outcome = pipeline.execute("名侦探柯南").await.unwrap();

    let by_id = |id: &str| {
        outcome
            .results
            .iter()
            .find(|c| c.media_id == id)
            .expect("candidate")
    };
    assert_eq!(by_id("m1").work_type, WorkType::Movie);
    assert_eq!(by_id("m2").work_type, WorkType::TvSeries);
}

#[tokio::test]
async fn alias_filter_drops_unrelated_candidates() {
    let db = TestDb::new().await;

    let mut scraper = MockScraper::new("mock");
    scraper.candidates = vec![
        scraper.candidate("good-1", "【独播】葬送的芙莉莲", WorkType::TvSeries),
        scraper.candidate("good-2", "Sousou no Frieren", WorkType::TvSeries),
        scraper.candidate("junk", "芙莉莲吃播精选", WorkType::TvSeries),
    ];

    let pipeline = build_pipeline(
        &db,
        vec![Arc::new(scraper)],
        vec![
            "葬送的芙莉莲".to_string(),
            "Sousou no Frieren".to_string(),
        ],
    )
    .await;
    let outcome = pipeline.execute("葬送的芙莉莲").await.unwrap();

    let ids: Vec<&str> = outcome.results.iter().map(|c| c.media_id.as_str()).collect();
    assert!(ids.contains(&"good-1"));
    assert!(ids.contains(&"good-2"));
    assert!(!ids.contains(&"junk"));
}

#[tokio::test]
async fn results_follow_scraper_display_order() {
    let db = TestDb::new().await;

    let mut first = MockScraper::new("alpha");
    first.candidates = vec![first.candidate("a1", "Some Show", WorkType::TvSeries)];
    let mut second = MockScraper::new("beta");
    second.candidates = vec![second.candidate("b1", "Some Show", WorkType::TvSeries)];

    let pipeline =
        build_pipeline(&db, vec![Arc::new(first), Arc::new(second)], Vec::new()).await;

    // Flip the discovery order around
    let mut settings = db.settings_repo.all_scraper_settings().await.unwrap();
    for setting in &mut settings {
        setting.display_order = if setting.provider_name == "beta" { 1 } else { 2 };
    }
    db.settings_repo
        .update_scraper_settings(&settings)
        .await
        .unwrap();

    let outcome = pipeline.execute("Some Show").await.unwrap();
    let providers: Vec<&str> = outcome.results.iter().map(|c| c.provider.as_str()).collect();
    assert_eq!(providers, vec!["beta", "alpha"]);
}

#[tokio::test]
async fn no_enabled_scrapers_is_a_configuration_error() {
    let db = TestDb::new().await;

    let scraper = MockScraper::new("mock");
    let pipeline = build_pipeline(&db, vec![Arc::new(scraper)], Vec::new()).await;

    let mut settings = db.settings_repo.all_scraper_settings().await.unwrap();
    for setting in &mut settings {
        setting.is_enabled = false;
    }
    db.settings_repo
        .update_scraper_settings(&settings)
        .await
        .unwrap();

    let result = pipeline.execute("anything").await;
    assert!(matches!(
        result,
        Err(danmud::shared::error::ApplicationError::Configuration(_))
    ));
}
