//! Discovery-time sync of scrapers and metadata sources, plus token and
//! OAuth-state behavior.

mod common;

use common::TestDb;
use chrono::{Duration, Utc};

#[tokio::test]
async fn sync_preserves_flags_and_appends_new_providers() {
    let db = TestDb::new().await;

    db.settings_repo
        .sync_scrapers(&["bilibili", "tencent"])
        .await
        .unwrap();
    let mut settings = db.settings_repo.all_scraper_settings().await.unwrap();
    assert_eq!(settings.len(), 2);

    // Operator disables one and flips the proxy flag
    for setting in &mut settings {
        if setting.provider_name == "tencent" {
            setting.is_enabled = false;
            setting.use_proxy = true;
        }
    }
    db.settings_repo
        .update_scraper_settings(&settings)
        .await
        .unwrap();

    // A later build adds a provider; operator flags survive the sync
    db.settings_repo
        .sync_scrapers(&["bilibili", "tencent", "iqiyi"])
        .await
        .unwrap();
    let settings = db.settings_repo.all_scraper_settings().await.unwrap();
    assert_eq!(settings.len(), 3);

    let tencent = settings
        .iter()
        .find(|s| s.provider_name == "tencent")
        .unwrap();
    assert!(!tencent.is_enabled);
    assert!(tencent.use_proxy);

    let iqiyi = settings.iter().find(|s| s.provider_name == "iqiyi").unwrap();
    let max_other = settings
        .iter()
        .filter(|s| s.provider_name != "iqiyi")
        .map(|s| s.display_order)
        .max()
        .unwrap();
    assert!(iqiyi.display_order > max_other);
}

#[tokio::test]
async fn stale_providers_are_pruned_unless_discovery_is_empty() {
    let db = TestDb::new().await;

    db.settings_repo
        .sync_scrapers(&["bilibili", "tencent"])
        .await
        .unwrap();

    // Empty discovery must not wipe the table
    db.settings_repo.sync_scrapers(&[]).await.unwrap();
    assert_eq!(db.settings_repo.all_scraper_settings().await.unwrap().len(), 2);

    // A non-empty discovery prunes what is gone
    db.settings_repo.sync_scrapers(&["bilibili"]).await.unwrap();
    let settings = db.settings_repo.all_scraper_settings().await.unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].provider_name, "bilibili");
}

#[tokio::test]
async fn tmdb_aux_search_is_forced_on_while_enabled() {
    let db = TestDb::new().await;

    db.settings_repo
        .sync_metadata_sources(&["tmdb", "bangumi"])
        .await
        .unwrap();
    let mut settings = db.settings_repo.all_metadata_settings().await.unwrap();

    for setting in &mut settings {
        setting.is_aux_search_enabled = false;
    }
    db.settings_repo
        .update_metadata_settings(&settings)
        .await
        .unwrap();

    let settings = db.settings_repo.all_metadata_settings().await.unwrap();
    let tmdb = settings.iter().find(|s| s.provider_name == "tmdb").unwrap();
    let bangumi = settings
        .iter()
        .find(|s| s.provider_name == "bangumi")
        .unwrap();
    assert!(tmdb.is_aux_search_enabled);
    assert!(!bangumi.is_aux_search_enabled);
}

#[tokio::test]
async fn token_validity_honors_enabled_flag_and_expiry() {
    let db = TestDb::new().await;

    db.auth_repo
        .create_token("player", "tok-valid", None)
        .await
        .unwrap();
    db.auth_repo
        .create_token("stale", "tok-expired", Some(Utc::now() - Duration::days(1)))
        .await
        .unwrap();
    let disabled_id = db
        .auth_repo
        .create_token("off", "tok-disabled", None)
        .await
        .unwrap();
    db.auth_repo.toggle_token(disabled_id).await.unwrap();

    assert!(db.auth_repo.validate_token("tok-valid").await.unwrap().is_some());
    assert!(db.auth_repo.validate_token("tok-expired").await.unwrap().is_none());
    assert!(db.auth_repo.validate_token("tok-disabled").await.unwrap().is_none());
    assert!(db.auth_repo.validate_token("tok-unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn oauth_states_are_single_use() {
    let db = TestDb::new().await;

    let state = db.auth_repo.create_oauth_state(7).await.unwrap();
    assert_eq!(db.auth_repo.consume_oauth_state(&state).await.unwrap(), Some(7));
    // Consumed under the row's lock: the second taker gets nothing
    assert_eq!(db.auth_repo.consume_oauth_state(&state).await.unwrap(), None);
}

#[tokio::test]
async fn expired_oauth_states_are_swept() {
    let db = TestDb::new().await;

    let state = db.auth_repo.create_oauth_state(7).await.unwrap();
    sqlx::query("UPDATE oauth_states SET expires_at = ?")
        .bind(Utc::now() - Duration::hours(1))
        .execute(&db.pool)
        .await
        .unwrap();

    assert_eq!(db.auth_repo.clear_expired_oauth_states().await.unwrap(), 1);
    assert_eq!(db.auth_repo.consume_oauth_state(&state).await.unwrap(), None);
}
