//! TMDB client
//!
//! Alias search and episode-group fetching with caching. Every call needs
//! `tmdb_api_key`; without it the client reports itself unconfigured and
//! alias search returns `ConfigMissing` so the manager skips it.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::repositories::{CacheRepository, ConfigRepository};
use crate::infrastructure::metadata::tmdb::dto::{
    DetailResponse, EpisodeGroupDetails, EpisodeGroupListResponse, EpisodeGroupSummary,
    SearchResponse,
};
use crate::interfaces::metadata::{MetadataSource, SourceStatus};
use crate::shared::error::MetadataError;

const PROVIDER: &str = "tmdb";
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_METADATA_TTL: i64 = 1800;

/// TMDB metadata client
pub struct TmdbClient {
    http: reqwest::Client,
    cache: Arc<dyn CacheRepository>,
    config: Arc<dyn ConfigRepository>,
}

impl TmdbClient {
    pub fn new(
        cache: Arc<dyn CacheRepository>,
        config: Arc<dyn ConfigRepository>,
    ) -> Result<Self, MetadataError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .map_err(|e| MetadataError::Network(e.to_string()))?,
            cache,
            config,
        })
    }

    async fn api_key(&self) -> Result<String, MetadataError> {
        let key = self.config.get("tmdb_api_key", "").await?;
        if key.is_empty() {
            return Err(MetadataError::ConfigMissing("tmdb_api_key".to_string()));
        }
        Ok(key)
    }

    async fn base_url(&self) -> Result<String, MetadataError> {
        let configured = self
            .config
            .get("tmdb_api_base_url", DEFAULT_BASE_URL)
            .await?;
        let trimmed = configured.trim_end_matches('/');
        Ok(if trimmed.ends_with("/3") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/3")
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<T, MetadataError> {
        let api_key = self.api_key().await?;
        let base = self.base_url().await?;
        let separator = if path_and_query.contains('?') { '&' } else { '?' };
        let url = format!("{base}{path_and_query}{separator}api_key={api_key}");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::UpstreamStatus(status.as_u16()));
        }
        Ok(response.json().await?)
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

    /// Alias collection: best search hit's zh-CN names, alternative titles,
    /// and the zh-TW display name
    async fn collect_aliases(&self, keyword: &str) -> Result<HashSet<String>, MetadataError> {
        let encoded = urlencoding::encode(keyword);

        let tv: SearchResponse = self
            .get_json(&format!("/search/tv?query={encoded}&language=zh-CN"))
            .await?;
        let movie: SearchResponse = self
            .get_json(&format!("/search/movie?query={encoded}&language=zh-CN"))
            .await?;

        let mut aliases = HashSet::new();
        let best = tv.results.into_iter().next().map(|entry| ("tv", entry)).or_else(|| {
            movie.results.into_iter().next().map(|entry| ("movie", entry))
        });
        let Some((media_type, entry)) = best else {
            return Ok(aliases);
        };

        let detail: DetailResponse = self
            .get_json(&format!(
                "/{media_type}/{}?append_to_response=alternative_titles&language=zh-CN",
                entry.id
            ))
            .await?;
        aliases.extend(detail.name.clone());
        aliases.extend(detail.title.clone());
        aliases.extend(detail.original_name.clone());
        aliases.extend(detail.original_title.clone());
        for alt in detail
            .alternative_titles
            .results
            .iter()
            .chain(detail.alternative_titles.titles.iter())
        {
            aliases.insert(alt.title.clone());
        }

        // Traditional-Chinese display name rounds out the set
        match self
            .get_json::<DetailResponse>(&format!("/{media_type}/{}?language=zh-TW", entry.id))
            .await
        {
            Ok(detail_tw) => {
                aliases.extend(detail_tw.name);
                aliases.extend(detail_tw.title);
            }
            Err(e) => warn!(provider = PROVIDER, "zh-TW detail fetch failed: {e}"),
        }

        aliases.retain(|a| !a.is_empty());
        Ok(aliases)
    }

    /// Lists a show's episode groups
    pub async fn episode_groups(
        &self,
        tmdb_tv_id: i64,
    ) -> Result<Vec<EpisodeGroupSummary>, MetadataError> {
        let cache_key = format!("tmdb_episode_groups_{tmdb_tv_id}");
        if let Some(raw) = self.cache.get(&cache_key).await? {
            if let Ok(cached) = serde_json::from_str(&raw) {
                return Ok(cached);
            }
        }

        let response: EpisodeGroupListResponse = self
            .get_json(&format!("/tv/{tmdb_tv_id}/episode_groups"))
            .await?;

        let ttl = self.metadata_ttl().await;
        if let Ok(json) = serde_json::to_string(&response.results) {
            self.cache
                .set(&cache_key, &json, ttl, Some(PROVIDER))
                .await?;
        }
        Ok(response.results)
    }

    /// Fetches one group's full season/episode layout
    pub async fn episode_group_details(
        &self,
        group_id: &str,
    ) -> Result<EpisodeGroupDetails, MetadataError> {
        let cache_key = format!("tmdb_episode_group_details_{group_id}");
        if let Some(raw) = self.cache.get(&cache_key).await? {
            if let Ok(cached) = serde_json::from_str(&raw) {
                return Ok(cached);
            }
        }

        let details: EpisodeGroupDetails = self
            .get_json(&format!("/tv/episode_group/{group_id}?language=zh-CN"))
            .await?;

        let ttl = self.metadata_ttl().await;
        if let Ok(json) = serde_json::to_string(&details) {
            self.cache
                .set(&cache_key, &json, ttl, Some(PROVIDER))
                .await?;
        }
        Ok(details)
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn config_keys(&self) -> &[&'static str] {
        &["tmdb_api_key", "tmdb_api_base_url", "tmdb_image_base_url"]
    }

    async fn search_aliases(&self, keyword: &str) -> Result<HashSet<String>, MetadataError> {
        let cache_key = format!("metadata_search_{PROVIDER}_{keyword}");
        if let Some(raw) = self.cache.get(&cache_key).await? {
            if let Ok(cached) = serde_json::from_str::<Vec<String>>(&raw) {
                return Ok(cached.into_iter().collect());
            }
        }

        let aliases = self.collect_aliases(keyword).await?;
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
        match self.api_key().await {
            Ok(_) => SourceStatus::Configured,
            Err(_) => SourceStatus::NotConfigured,
        }
    }
}
