//! Metadata source manager
//!
//! Orchestrates the registered metadata providers: keeps their settings
//! rows in sync, unions alias sets across the enabled auxiliary sources,
//! and surfaces per-provider status for the admin UI.

use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::repositories::SettingsRepository;
use crate::interfaces::metadata::MetadataSource;
use crate::shared::error::{ApplicationError, MetadataError};

/// A settings row enriched with ephemeral status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSourceStatus {
    pub provider_name: String,
    pub is_enabled: bool,
    pub is_aux_search_enabled: bool,
    pub display_order: i32,
    pub use_proxy: bool,
    pub status: String,
}

/// Manager over the registered metadata sources
pub struct MetadataSourceManager {
    sources: HashMap<&'static str, Arc<dyn MetadataSource>>,
    settings: Arc<dyn SettingsRepository>,
}

impl MetadataSourceManager {
    /// Registers the sources and syncs their settings rows
    pub async fn initialize(
        sources: Vec<Arc<dyn MetadataSource>>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Result<Self, ApplicationError> {
        let mut map = HashMap::new();
        for source in sources {
            map.insert(source.provider_name(), source);
        }

        let names: Vec<&str> = map.keys().copied().collect();
        settings.sync_metadata_sources(&names).await?;
        info!("metadata source manager initialized with {} providers", map.len());

        Ok(Self {
            sources: map,
            settings,
        })
    }

    /// Unions alias sets from every enabled auxiliary source. Unconfigured
    /// sources are skipped silently; other failures are logged and do not
    /// fail the search.
    pub async fn search_aliases(&self, keyword: &str) -> HashSet<String> {
        let settings = match self.settings.all_metadata_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to load metadata source settings: {e}");
                return HashSet::new();
            }
        };

        let mut lookups = Vec::new();
        for setting in settings {
            if !setting.is_enabled || !setting.is_aux_search_enabled {
                continue;
            }
            let Some(source) = self.sources.get(setting.provider_name.as_str()) else {
                continue;
            };
            let source = source.clone();
            let keyword = keyword.to_string();
            lookups.push(async move {
                let name = source.provider_name();
                (name, source.search_aliases(&keyword).await)
            });
        }

        let mut aliases = HashSet::new();
        for (provider, result) in join_all(lookups).await {
            match result {
                Ok(found) => aliases.extend(found),
                Err(MetadataError::ConfigMissing(key)) => {
                    info!(provider, "skipping auxiliary search, {key} not set");
                }
                Err(e) => warn!(provider, "auxiliary alias search failed: {e}"),
            }
        }
        aliases
    }

    /// Settings rows with live status, for the admin UI
    pub async fn sources_with_status(
        &self,
    ) -> Result<Vec<MetadataSourceStatus>, ApplicationError> {
        let settings = self.settings.all_metadata_settings().await?;

        let mut result = Vec::with_capacity(settings.len());
        for setting in settings {
            let status = match self.sources.get(setting.provider_name.as_str()) {
                Some(source) => source.check_status().await.as_str().to_string(),
                None => "unknown".to_string(),
            };
            result.push(MetadataSourceStatus {
                provider_name: setting.provider_name,
                is_enabled: setting.is_enabled,
                is_aux_search_enabled: setting.is_aux_search_enabled,
                display_order: setting.display_order,
                use_proxy: setting.use_proxy,
                status,
            });
        }
        Ok(result)
    }
}
