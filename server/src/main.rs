use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use danmud::application::jobs::{IncrementalRefreshJob, Job, TmdbMappingRefreshJob};
use danmud::application::services::{
    LibraryImportWebhook, MetadataSourceManager, WebhookHandler, WebhookRegistry,
};
use danmud::application::use_cases::{
    ImportUseCase, MatchUseCase, RefreshUseCase, SearchProviderUseCase,
};
use danmud::domain::repositories::{
    AnimeRepository, AuthRepository, CacheRepository, CommentRepository, ConfigRepository,
    EpisodeGroupRepository, EpisodeRepository, ScheduledTaskRepository, SettingsRepository,
    SourceRepository, TaskRepository,
};
use danmud::infrastructure::database::{initialize_schema, ConnectionPool, ConnectionPoolConfig};
use danmud::infrastructure::maintenance;
use danmud::infrastructure::metadata::{BangumiClient, TmdbClient};
use danmud::infrastructure::persistence::sqlite::{
    SqliteAnimeRepository, SqliteAuthRepository, SqliteCacheRepository, SqliteCommentRepository,
    SqliteConfigRepository, SqliteEpisodeGroupRepository, SqliteEpisodeRepository,
    SqliteScheduledTaskRepository, SqliteSettingsRepository, SqliteSourceRepository,
    SqliteTaskRepository,
};
use danmud::infrastructure::scrapers::{
    bilibili::BilibiliScraper, tencent::TencentScraper, ScraperRegistry,
};
use danmud::infrastructure::tasks::{Scheduler, TaskManager};
use danmud::interfaces::metadata::MetadataSource;
use danmud::interfaces::scrapers::Scraper;
use danmud::presentation::http::handlers::{
    compat_handlers, library_handlers, scheduled_task_handlers, scraper_handlers,
    search_handlers, settings_handlers, task_handlers, webhook_handlers,
};
use danmud::presentation::http::middleware::{auth, cors, logging};
use danmud::presentation::http::AppState;

/// Runtime config defaults persisted on first boot
const CONFIG_DEFAULTS: [(&str, &str); 8] = [
    ("search_ttl_seconds", "300"),
    ("episodes_ttl_seconds", "1800"),
    ("base_info_ttl_seconds", "1800"),
    ("metadata_search_ttl_seconds", "1800"),
    ("proxy_enabled", "false"),
    ("proxy_url", ""),
    ("tmdb_api_base_url", "https://api.themoviedb.org/3"),
    ("incremental_refresh_failure_threshold", "10"),
];

struct Config {
    database_url: String,
    port: u16,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:danmu.db?mode=rwc".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "7768".to_string())
                .parse()?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Database
    let pool_config = ConnectionPoolConfig::new(config.database_url.clone());
    let connection_pool = ConnectionPool::create(pool_config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create connection pool: {e}"))?;
    let pool = connection_pool.inner().clone();
    initialize_schema(&pool).await?;

    // Repositories
    let anime_repo: Arc<dyn AnimeRepository> = Arc::new(SqliteAnimeRepository::new(pool.clone()));
    let source_repo: Arc<dyn SourceRepository> =
        Arc::new(SqliteSourceRepository::new(pool.clone()));
    let episode_repo: Arc<dyn EpisodeRepository> =
        Arc::new(SqliteEpisodeRepository::new(pool.clone()));
    let comment_repo: Arc<dyn CommentRepository> =
        Arc::new(SqliteCommentRepository::new(pool.clone()));
    let cache_repo: Arc<dyn CacheRepository> = Arc::new(SqliteCacheRepository::new(pool.clone()));
    let config_repo: Arc<dyn ConfigRepository> =
        Arc::new(SqliteConfigRepository::new(pool.clone()));
    let settings_repo: Arc<dyn SettingsRepository> =
        Arc::new(SqliteSettingsRepository::new(pool.clone()));
    let task_repo: Arc<dyn TaskRepository> = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let scheduled_repo: Arc<dyn ScheduledTaskRepository> =
        Arc::new(SqliteScheduledTaskRepository::new(pool.clone()));
    let auth_repo: Arc<dyn AuthRepository> = Arc::new(SqliteAuthRepository::new(pool.clone()));
    let group_repo: Arc<dyn EpisodeGroupRepository> =
        Arc::new(SqliteEpisodeGroupRepository::new(pool.clone()));

    config_repo.initialize_defaults(&CONFIG_DEFAULTS).await?;

    // Crash recovery: rows still RUNNING or PAUSED were interrupted
    let interrupted = task_repo.mark_interrupted().await?;
    if interrupted > 0 {
        warn!(interrupted, "marked interrupted tasks as failed");
    }

    // Scrapers; proxy flags come from the settings rows of a previous run
    let mut scrapers: Vec<Arc<dyn Scraper>> = Vec::new();
    for provider in ["bilibili", "tencent"] {
        let use_proxy = settings_repo
            .scraper_setting(provider)
            .await?
            .map(|s| s.use_proxy)
            .unwrap_or(false);
        let scraper: Arc<dyn Scraper> = match provider {
            "bilibili" => Arc::new(
                BilibiliScraper::new(cache_repo.clone(), config_repo.clone(), use_proxy).await?,
            ),
            "tencent" => Arc::new(
                TencentScraper::new(cache_repo.clone(), config_repo.clone(), use_proxy).await?,
            ),
            _ => unreachable!(),
        };
        scrapers.push(scraper);
    }
    let registry = Arc::new(ScraperRegistry::initialize(scrapers, settings_repo.clone()).await?);

    // Metadata sources
    let tmdb = Arc::new(TmdbClient::new(cache_repo.clone(), config_repo.clone())?);
    let bangumi = Arc::new(BangumiClient::new(cache_repo.clone(), config_repo.clone())?);
    let metadata_sources: Vec<Arc<dyn MetadataSource>> = vec![tmdb.clone(), bangumi];
    let metadata_manager = Arc::new(
        MetadataSourceManager::initialize(metadata_sources, settings_repo.clone()).await?,
    );

    // Task engine
    let task_manager = Arc::new(TaskManager::new(task_repo.clone()));
    task_manager.start().await;

    // Use cases
    let search_use_case = Arc::new(SearchProviderUseCase::new(
        registry.clone(),
        metadata_manager.clone(),
    ));
    let import_use_case = Arc::new(ImportUseCase::new(
        registry.clone(),
        anime_repo.clone(),
        source_repo.clone(),
        episode_repo.clone(),
        comment_repo.clone(),
    ));
    let refresh_use_case = Arc::new(RefreshUseCase::new(
        registry.clone(),
        source_repo.clone(),
        episode_repo.clone(),
        comment_repo.clone(),
        import_use_case.clone(),
    ));
    let match_use_case = Arc::new(MatchUseCase::new(anime_repo.clone(), group_repo.clone()));

    // Scheduler with the built-in job families
    let jobs: Vec<Arc<dyn Job>> = vec![
        Arc::new(IncrementalRefreshJob::new(
            registry.clone(),
            source_repo.clone(),
            episode_repo.clone(),
            comment_repo.clone(),
            config_repo.clone(),
        )),
        Arc::new(TmdbMappingRefreshJob::new(
            anime_repo.clone(),
            group_repo.clone(),
            tmdb.clone(),
        )),
    ];
    let scheduler = Arc::new(Scheduler::new(scheduled_repo, task_manager.clone(), jobs));
    scheduler.start().await?;

    // Periodic sweeps
    maintenance::spawn_sweeps(cache_repo.clone(), auth_repo.clone());

    // Webhooks
    let webhook_handlers_list: Vec<Arc<dyn WebhookHandler>> =
        vec![Arc::new(LibraryImportWebhook::new(
            search_use_case.clone(),
            import_use_case.clone(),
            task_manager.clone(),
        ))];
    let webhooks = Arc::new(WebhookRegistry::new(webhook_handlers_list));

    let state = AppState {
        anime_repo,
        source_repo,
        episode_repo,
        comment_repo,
        cache_repo,
        config_repo,
        settings_repo,
        task_repo,
        auth_repo,
        registry,
        metadata_manager,
        tmdb,
        task_manager,
        scheduler,
        webhooks,
        search_use_case,
        import_use_case,
        refresh_use_case,
        match_use_case,
    };

    // Player-facing compatibility routes, token-gated
    let compat_routes = Router::new()
        .route("/api/search/anime", get(compat_handlers::search_anime))
        .route("/api/match", get(compat_handlers::match_episode))
        .route("/api/comment/:episode_id", get(compat_handlers::get_comments))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::token_auth_middleware,
        ));

    let admin_routes = Router::new()
        // Provider search and import
        .route("/api/ui/search/provider", get(search_handlers::search_provider))
        .route("/api/ui/search/episodes", get(search_handlers::preview_episodes))
        .route("/api/ui/import", post(library_handlers::import_from_provider))
        // Library
        .route("/api/ui/library", get(library_handlers::get_library))
        .route("/api/ui/library/search", get(library_handlers::search_library))
        .route(
            "/api/ui/library/:anime_id",
            get(library_handlers::get_anime_details)
                .put(library_handlers::edit_anime)
                .delete(library_handlers::delete_anime),
        )
        .route(
            "/api/ui/library/:anime_id/sources",
            get(library_handlers::get_sources),
        )
        .route(
            "/api/ui/library/:anime_id/reassociate",
            post(library_handlers::reassociate_sources),
        )
        // Sources
        .route(
            "/api/ui/sources/:source_id/favorite",
            put(library_handlers::toggle_source_favorite),
        )
        .route(
            "/api/ui/sources/:source_id/incremental-refresh",
            put(library_handlers::toggle_source_incremental_refresh),
        )
        .route(
            "/api/ui/sources/:source_id/refresh",
            post(library_handlers::refresh_source),
        )
        .route(
            "/api/ui/sources/:source_id/reorder",
            post(library_handlers::reorder_source_episodes),
        )
        .route(
            "/api/ui/sources/:source_id/episodes",
            get(library_handlers::get_source_episodes),
        )
        .route(
            "/api/ui/sources/:source_id",
            axum::routing::delete(library_handlers::delete_source),
        )
        .route(
            "/api/ui/sources/bulk-delete",
            post(library_handlers::delete_bulk_sources),
        )
        // Episodes
        .route(
            "/api/ui/episodes/:episode_id",
            put(library_handlers::edit_episode).delete(library_handlers::delete_episode),
        )
        .route(
            "/api/ui/episodes/:episode_id/refresh",
            post(library_handlers::refresh_episode),
        )
        // Tasks
        .route("/api/ui/tasks", get(task_handlers::list_tasks))
        .route(
            "/api/ui/tasks/:task_id",
            get(task_handlers::get_task).delete(task_handlers::delete_task),
        )
        .route("/api/ui/tasks/:task_id/pause", post(task_handlers::pause_task))
        .route("/api/ui/tasks/:task_id/resume", post(task_handlers::resume_task))
        .route("/api/ui/tasks/:task_id/abort", post(task_handlers::abort_task))
        // Scheduled tasks
        .route(
            "/api/ui/scheduled-tasks",
            get(scheduled_task_handlers::list_scheduled_tasks)
                .post(scheduled_task_handlers::create_scheduled_task),
        )
        .route(
            "/api/ui/scheduled-tasks/job-types",
            get(scheduled_task_handlers::available_job_types),
        )
        .route(
            "/api/ui/scheduled-tasks/:id",
            put(scheduled_task_handlers::update_scheduled_task)
                .delete(scheduled_task_handlers::delete_scheduled_task),
        )
        .route(
            "/api/ui/scheduled-tasks/:id/run",
            post(scheduled_task_handlers::run_scheduled_task_now),
        )
        // Scrapers
        .route(
            "/api/ui/scrapers",
            get(scraper_handlers::list_scrapers).put(scraper_handlers::update_scrapers),
        )
        .route(
            "/api/ui/scrapers/:provider/config",
            get(scraper_handlers::get_scraper_config).put(scraper_handlers::update_scraper_config),
        )
        .route(
            "/api/ui/scrapers/:provider/action",
            post(scraper_handlers::execute_scraper_action),
        )
        // Metadata sources, tokens, UA rules, config, cache
        .route(
            "/api/ui/metadata-sources",
            get(settings_handlers::list_metadata_sources)
                .put(settings_handlers::update_metadata_sources),
        )
        .route(
            "/api/ui/tokens",
            get(settings_handlers::list_tokens).post(settings_handlers::create_token),
        )
        .route(
            "/api/ui/tokens/:id",
            axum::routing::delete(settings_handlers::delete_token),
        )
        .route("/api/ui/tokens/:id/toggle", put(settings_handlers::toggle_token))
        .route(
            "/api/ui/ua-rules",
            get(settings_handlers::list_ua_rules).post(settings_handlers::add_ua_rule),
        )
        .route(
            "/api/ui/ua-rules/:id",
            axum::routing::delete(settings_handlers::delete_ua_rule),
        )
        .route(
            "/api/ui/config/webhook-key/regenerate",
            post(settings_handlers::regenerate_webhook_key),
        )
        .route(
            "/api/ui/config/:key",
            get(settings_handlers::get_config_value).put(settings_handlers::set_config_value),
        )
        .route("/api/ui/cache/clear", post(settings_handlers::clear_cache))
        .route(
            "/api/ui/tmdb/tv/:tv_id/episode-groups",
            get(settings_handlers::list_tmdb_episode_groups),
        )
        .route(
            "/api/ui/tmdb/episode-groups/:group_id",
            get(settings_handlers::get_tmdb_episode_group),
        )
        .route(
            "/api/ui/webhooks/types",
            get(webhook_handlers::available_webhook_types),
        );

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(compat_routes)
        .merge(admin_routes)
        .route(
            "/api/webhook/:webhook_type",
            post(webhook_handlers::handle_webhook),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::ua_filter_middleware,
        ))
        .layer(axum::middleware::from_fn(logging::logging_middleware))
        .layer(cors::cors_layer())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("server listening on {addr}");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
