//! Database Schema Management
//!
//! Creates every table the engine needs. Idempotent: safe to call on every
//! startup.

use sqlx::{Pool, Sqlite};
use tracing::info;

/// Initialize all database tables
pub async fn initialize_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    info!("Initializing database schema");

    // 1. Library: anime, metadata, aliases
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'tv_series',
            season INTEGER NOT NULL DEFAULT 1,
            image_url TEXT,
            local_image_path TEXT,
            episode_count INTEGER,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_anime_title ON anime(title);")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime_metadata (
            anime_id INTEGER PRIMARY KEY,
            tmdb_id TEXT,
            tmdb_episode_group_id TEXT,
            imdb_id TEXT,
            tvdb_id TEXT,
            douban_id TEXT,
            bangumi_id TEXT,
            FOREIGN KEY(anime_id) REFERENCES anime(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime_aliases (
            anime_id INTEGER PRIMARY KEY,
            name_en TEXT,
            name_jp TEXT,
            name_romaji TEXT,
            alias_cn_1 TEXT,
            alias_cn_2 TEXT,
            alias_cn_3 TEXT,
            FOREIGN KEY(anime_id) REFERENCES anime(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // 2. Sources, episodes, comments
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime_sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            anime_id INTEGER NOT NULL,
            provider_name TEXT NOT NULL,
            media_id TEXT NOT NULL,
            is_favorited INTEGER NOT NULL DEFAULT 0,
            incremental_refresh_enabled INTEGER NOT NULL DEFAULT 0,
            incremental_refresh_failures INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(anime_id, provider_name, media_id),
            FOREIGN KEY(anime_id) REFERENCES anime(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS episode (
            id INTEGER PRIMARY KEY,
            source_id INTEGER NOT NULL,
            episode_index INTEGER NOT NULL,
            provider_episode_id TEXT NOT NULL,
            title TEXT NOT NULL,
            source_url TEXT,
            fetched_at DATETIME,
            comment_count INTEGER NOT NULL DEFAULT 0,
            UNIQUE(source_id, episode_index),
            FOREIGN KEY(source_id) REFERENCES anime_sources(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            episode_id INTEGER NOT NULL,
            cid TEXT NOT NULL,
            p TEXT NOT NULL,
            m TEXT NOT NULL,
            t REAL NOT NULL,
            UNIQUE(episode_id, cid),
            FOREIGN KEY(episode_id) REFERENCES episode(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // 3. Provider settings
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scrapers (
            provider_name TEXT PRIMARY KEY,
            is_enabled INTEGER NOT NULL DEFAULT 1,
            display_order INTEGER NOT NULL DEFAULT 0,
            use_proxy INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metadata_sources (
            provider_name TEXT PRIMARY KEY,
            is_enabled INTEGER NOT NULL DEFAULT 1,
            is_aux_search_enabled INTEGER NOT NULL DEFAULT 0,
            display_order INTEGER NOT NULL DEFAULT 0,
            use_proxy INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    // 4. TMDB episode-group mappings
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tmdb_episode_mapping (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tmdb_tv_id INTEGER NOT NULL,
            tmdb_episode_group_id TEXT NOT NULL,
            tmdb_episode_id INTEGER NOT NULL,
            tmdb_season_number INTEGER NOT NULL,
            tmdb_episode_number INTEGER NOT NULL,
            custom_season_number INTEGER NOT NULL,
            custom_episode_number INTEGER NOT NULL,
            absolute_episode_number INTEGER NOT NULL,
            UNIQUE(tmdb_tv_id, tmdb_episode_group_id, tmdb_episode_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tmdb_mapping_custom \
         ON tmdb_episode_mapping(tmdb_tv_id, tmdb_episode_group_id, custom_season_number, custom_episode_number);",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tmdb_mapping_absolute \
         ON tmdb_episode_mapping(tmdb_tv_id, tmdb_episode_group_id, absolute_episode_number);",
    )
    .execute(pool)
    .await?;

    // 5. Cache and config
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cache (
            cache_key TEXT PRIMARY KEY,
            cache_provider TEXT,
            cache_value TEXT NOT NULL,
            expires_at DATETIME NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS config (
            config_key TEXT PRIMARY KEY,
            config_value TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // 6. Tasks and schedules
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_history (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            progress INTEGER NOT NULL DEFAULT 0,
            description TEXT NOT NULL DEFAULT '',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            finished_at DATETIME
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scheduled_tasks (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            job_type TEXT NOT NULL,
            cron_expression TEXT NOT NULL,
            is_enabled INTEGER NOT NULL DEFAULT 1,
            last_run_at DATETIME,
            next_run_at DATETIME
        );
        "#,
    )
    .execute(pool)
    .await?;

    // 7. Access control
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            token TEXT NOT NULL UNIQUE,
            is_enabled INTEGER NOT NULL DEFAULT 1,
            expires_at DATETIME,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ua_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ua_string TEXT NOT NULL UNIQUE,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS oauth_states (
            state_key TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            expires_at DATETIME NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
