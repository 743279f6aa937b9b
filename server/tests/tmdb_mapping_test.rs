//! Season-override matching through the TMDB episode-group mapping table.

mod common;

use common::TestDb;

use danmud::application::use_cases::MatchUseCase;
use danmud::domain::entities::EpisodeGroupMapping;
use danmud::domain::repositories::{AnimeDetailsUpdate, NewEpisode};
use danmud::domain::value_objects::WorkType;
use danmud::infrastructure::metadata::tmdb::dto::{
    EpisodeGroupDetails, GroupEpisode, GroupSeason,
};
use danmud::infrastructure::metadata::tmdb::materialize_group_mappings;

fn mapping(
    absolute: i32,
    custom_season: i32,
    custom_episode: i32,
) -> EpisodeGroupMapping {
    EpisodeGroupMapping {
        tmdb_tv_id: 1396,
        tmdb_episode_group_id: "g1".to_string(),
        tmdb_episode_id: 1000 + absolute as i64,
        tmdb_season_number: 1,
        tmdb_episode_number: absolute,
        custom_season_number: custom_season,
        custom_episode_number: custom_episode,
        absolute_episode_number: absolute,
    }
}

/// Seeds an anime bound to tmdb 1396 / group g1 whose source carries
/// absolute episode numbering
async fn seed_mapped_library(db: &TestDb) -> i64 {
    let anime_id = db
        .anime_repo
        .get_or_create("Mapped Show", WorkType::TvSeries, 1, None, None)
        .await
        .unwrap();
    db.anime_repo
        .update_details(
            anime_id,
            &AnimeDetailsUpdate {
                title: "Mapped Show".to_string(),
                work_type: WorkType::TvSeries,
                season: 1,
                episode_count: None,
                image_url: None,
                tmdb_id: Some("1396".to_string()),
                tmdb_episode_group_id: Some("g1".to_string()),
                imdb_id: None,
                tvdb_id: None,
                douban_id: None,
                bangumi_id: None,
                name_en: None,
                name_jp: None,
                name_romaji: None,
                alias_cn_1: None,
                alias_cn_2: None,
                alias_cn_3: None,
            },
        )
        .await
        .unwrap();

    let source_id = db
        .source_repo
        .link(anime_id, "mockprov", "m1")
        .await
        .unwrap();
    // The scrapers table row makes the display-order join work
    db.settings_repo.sync_scrapers(&["mockprov"]).await.unwrap();

    for index in 1..=13 {
        db.episode_repo
            .get_or_create(&NewEpisode {
                anime_id,
                source_id,
                episode_index: index,
                title: format!("Absolute {index}"),
                source_url: None,
                provider_episode_id: format!("abs-{index}"),
            })
            .await
            .unwrap();
    }
    anime_id
}

#[tokio::test]
async fn custom_and_absolute_lookups_reach_the_same_episode() {
    let db = TestDb::new().await;
    seed_mapped_library(&db).await;

    // Season 1 holds 12 episodes; absolute 13 is season 2 episode 1
    let mut rows = Vec::new();
    for abs in 1..=12 {
        rows.push(mapping(abs, 1, abs));
    }
    rows.push(mapping(13, 2, 1));
    db.group_repo.replace_mappings("g1", &rows).await.unwrap();

    let by_custom = db
        .group_repo
        .find_local_episodes("1396", "g1", Some(2), 1)
        .await
        .unwrap();
    let by_absolute = db
        .group_repo
        .find_local_episodes("1396", "g1", None, 13)
        .await
        .unwrap();

    assert_eq!(by_custom.len(), 1);
    assert_eq!(by_absolute.len(), 1);
    assert_eq!(by_custom[0].episode_id, by_absolute[0].episode_id);
    assert_eq!(by_custom[0].episode_title, "Absolute 13");
}

#[tokio::test]
async fn replace_mappings_is_atomic_per_group() {
    let db = TestDb::new().await;

    db.group_repo
        .replace_mappings("g1", &[mapping(1, 1, 1), mapping(2, 1, 2)])
        .await
        .unwrap();
    // A second materialization fully supersedes the first
    db.group_repo
        .replace_mappings("g1", &[mapping(5, 1, 5)])
        .await
        .unwrap();

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tmdb_episode_mapping WHERE tmdb_episode_group_id = 'g1'")
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn match_falls_back_to_group_mapping() {
    let db = TestDb::new().await;
    seed_mapped_library(&db).await;

    let mut rows = Vec::new();
    for abs in 1..=12 {
        rows.push(mapping(abs, 1, abs));
    }
    rows.push(mapping(13, 2, 1));
    db.group_repo.replace_mappings("g1", &rows).await.unwrap();

    let matcher = MatchUseCase::new(db.anime_repo.clone(), db.group_repo.clone());

    // The library only has season 1, so the direct strategies miss S02E01;
    // the group mapping resolves it to absolute episode 13
    let outcome = matcher.match_episode("Mapped Show S02E01").await.unwrap();
    assert!(outcome.is_matched);
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].episode_title, "Absolute 13");
}

#[tokio::test]
async fn materialized_rows_line_up_with_lookup_indexes() {
    let db = TestDb::new().await;
    seed_mapped_library(&db).await;

    let details = EpisodeGroupDetails {
        id: "g1".to_string(),
        name: "Broadcast".to_string(),
        groups: vec![
            GroupSeason {
                id: "part1".to_string(),
                name: "Part 1".to_string(),
                order: 1,
                episodes: (0..12)
                    .map(|i| GroupEpisode {
                        id: 2000 + i as i64,
                        name: String::new(),
                        episode_number: i + 1,
                        season_number: 1,
                        order: i,
                    })
                    .collect(),
            },
            GroupSeason {
                id: "part2".to_string(),
                name: "Part 2".to_string(),
                order: 2,
                episodes: vec![GroupEpisode {
                    id: 3000,
                    name: String::new(),
                    episode_number: 13,
                    season_number: 1,
                    order: 12,
                }],
            },
        ],
    };
    let rows = materialize_group_mappings(1396, &details);
    db.group_repo.replace_mappings("g1", &rows).await.unwrap();

    let hits = db
        .group_repo
        .find_local_episodes("1396", "g1", Some(2), 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].episode_title, "Absolute 13");
}
