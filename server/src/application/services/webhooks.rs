//! Webhook handling
//!
//! The webhook entry point is a thin adapter: it authenticates against the
//! persisted `webhook_api_key` and hands the raw payload to a registered
//! handler. Handlers are pluggable per `{type}` path segment.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::use_cases::{ImportRequest, ImportUseCase, SearchProviderUseCase};
use crate::domain::repositories::ExternalIds;
use crate::infrastructure::tasks::TaskManager;
use crate::shared::error::ApplicationError;

/// A webhook payload processor
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// The `{type}` path segment this handler owns
    fn webhook_type(&self) -> &'static str;

    /// Processes one raw payload
    async fn handle(&self, payload: serde_json::Value) -> Result<(), ApplicationError>;
}

/// Registry of webhook handlers, keyed by type
pub struct WebhookRegistry {
    handlers: HashMap<&'static str, Arc<dyn WebhookHandler>>,
}

impl WebhookRegistry {
    pub fn new(handlers: Vec<Arc<dyn WebhookHandler>>) -> Self {
        Self {
            handlers: handlers
                .into_iter()
                .map(|h| (h.webhook_type(), h))
                .collect(),
        }
    }

    /// Looks up the handler for a type; unknown types are a 404 at the
    /// boundary
    pub fn get(&self, webhook_type: &str) -> Option<Arc<dyn WebhookHandler>> {
        self.handlers.get(webhook_type).cloned()
    }

    /// Registered type names
    pub fn available_types(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

/// Built-in handler for Sonarr/Radarr-shaped "item added" notifications:
/// searches the enabled providers for the announced title and enqueues an
/// import of the best hit
pub struct LibraryImportWebhook {
    search: Arc<SearchProviderUseCase>,
    import: Arc<ImportUseCase>,
    task_manager: Arc<TaskManager>,
}

impl LibraryImportWebhook {
    pub fn new(
        search: Arc<SearchProviderUseCase>,
        import: Arc<ImportUseCase>,
        task_manager: Arc<TaskManager>,
    ) -> Self {
        Self {
            search,
            import,
            task_manager,
        }
    }
}

#[async_trait]
impl WebhookHandler for LibraryImportWebhook {
    fn webhook_type(&self) -> &'static str {
        "library"
    }

    async fn handle(&self, payload: serde_json::Value) -> Result<(), ApplicationError> {
        // Accept both a bare title and the nested series/movie shapes the
        // *arr family sends
        let title = payload
            .get("title")
            .or_else(|| payload.pointer("/series/title"))
            .or_else(|| payload.pointer("/movie/title"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ApplicationError::Configuration("webhook payload carries no title".to_string())
            })?
            .to_string();
        let season = payload
            .pointer("/episodes/0/seasonNumber")
            .and_then(|v| v.as_i64())
            .map(|s| s as i32);

        info!(%title, ?season, "webhook import request");
        let outcome = self.search.execute(&title).await?;
        let Some(best) = outcome.results.into_iter().next() else {
            warn!(%title, "webhook import found no provider results");
            return Ok(());
        };

        let request = ImportRequest {
            provider: best.provider.clone(),
            media_id: best.media_id.clone(),
            anime_title: best.title.clone(),
            work_type: best.work_type,
            season: season.unwrap_or(best.season),
            current_episode_index: None,
            image_url: best.image_url.clone(),
            external_ids: ExternalIds::default(),
        };
        let import = self.import.clone();
        let task_title = format!("Webhook import: {} ({})", best.title, best.provider);
        self.task_manager
            .submit(
                &task_title,
                Box::new(move |progress| {
                    Box::pin(async move { import.execute(&request, progress.as_ref()).await })
                }),
            )
            .await?;
        Ok(())
    }
}
