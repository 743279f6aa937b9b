//! Bangumi metadata adapter
//!
//! Subject search producing cn/jp alias sets. No API key required; the
//! status probe just checks reachability.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::domain::repositories::{CacheRepository, ConfigRepository};
use crate::interfaces::metadata::{MetadataSource, SourceStatus};
use crate::shared::error::MetadataError;

const PROVIDER: &str = "bangumi";
const API_URL: &str = "https://api.bgm.tv";
const DEFAULT_METADATA_TTL: i64 = 1800;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    list: Option<Vec<Subject>>,
}

#[derive(Debug, Deserialize)]
struct Subject {
    name: String,
    name_cn: Option<String>,
}

/// Bangumi metadata client
pub struct BangumiClient {
    http: reqwest::Client,
    cache: Arc<dyn CacheRepository>,
    config: Arc<dyn ConfigRepository>,
}

impl BangumiClient {
    pub fn new(
        cache: Arc<dyn CacheRepository>,
        config: Arc<dyn ConfigRepository>,
    ) -> Result<Self, MetadataError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .user_agent("danmud/0.1 (https://github.com)")
                .build()
                .map_err(|e| MetadataError::Network(e.to_string()))?,
            cache,
            config,
        })
    }

    async fn metadata_ttl(&self) -> i64 {
        self.config
            .get(
                "metadata_search_ttl_seconds",
                &DEFAULT_METADATA_TTL.to_string(),
            )
            .await
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_METADATA_TTL)
    }
}

#[async_trait]
impl MetadataSource for BangumiClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn config_keys(&self) -> &[&'static str] {
        &["bangumi_client_id", "bangumi_client_secret"]
    }

    async fn search_aliases(&self, keyword: &str) -> Result<HashSet<String>, MetadataError> {
        let cache_key = format!("metadata_search_{PROVIDER}_{keyword}");
        if let Some(raw) = self.cache.get(&cache_key).await? {
            if let Ok(cached) = serde_json::from_str::<Vec<String>>(&raw) {
                return Ok(cached.into_iter().collect());
            }
        }

        let url = format!(
            "{API_URL}/search/subject/{}?type=2&responseGroup=small",
            urlencoding::encode(keyword)
        );
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::UpstreamStatus(status.as_u16()));
        }
        let parsed: SearchResponse = response.json().await?;

        let mut aliases = HashSet::new();
        for subject in parsed.list.unwrap_or_default() {
            aliases.insert(subject.name);
            if let Some(name_cn) = subject.name_cn {
                aliases.insert(name_cn);
            }
        }
        aliases.retain(|a| !a.is_empty());
        info!(provider = PROVIDER, keyword, count = aliases.len(), "alias search finished");

        let ttl = self.metadata_ttl().await;
        let as_vec: Vec<&String> = aliases.iter().collect();
        if let Ok(json) = serde_json::to_string(&as_vec) {
            self.cache
                .set(&cache_key, &json, ttl, Some(PROVIDER))
                .await?;
        }
        Ok(aliases)
    }

    async fn check_status(&self) -> SourceStatus {
        match self.http.get(API_URL).send().await {
            Ok(_) => SourceStatus::Reachable,
            Err(_) => SourceStatus::Unreachable,
        }
    }
}
