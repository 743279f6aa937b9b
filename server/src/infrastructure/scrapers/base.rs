//! Shared scraper plumbing
//!
//! Cache access with typed re-validation, TTL configuration, and the
//! combined junk-title filter every scraper applies to search results and
//! episode listings.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::domain::repositories::{CacheRepository, ConfigRepository};
use crate::shared::error::ScraperError;

/// Default TTLs, overridable through config
pub const DEFAULT_SEARCH_TTL: i64 = 300;
pub const DEFAULT_EPISODES_TTL: i64 = 1800;

/// Shared state and helpers for scraper implementations
pub struct ScraperBase {
    provider_name: &'static str,
    cache: Arc<dyn CacheRepository>,
    config: Arc<dyn ConfigRepository>,
    /// Scraper-defined junk pattern, applied together with the user's
    builtin_blacklist: Option<Regex>,
}

impl ScraperBase {
    pub fn new(
        provider_name: &'static str,
        cache: Arc<dyn CacheRepository>,
        config: Arc<dyn ConfigRepository>,
        builtin_blacklist: Option<Regex>,
    ) -> Self {
        Self {
            provider_name,
            cache,
            config,
            builtin_blacklist,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    /// Reads a TTL config key, falling back to the default on bad values
    pub async fn ttl(&self, key: &str, default: i64) -> i64 {
        match self.config.get(key, &default.to_string()).await {
            Ok(value) => value.parse().unwrap_or(default),
            Err(_) => default,
        }
    }

    /// Cache read with typed re-validation. A value that no longer parses
    /// against the expected shape is logged and treated as a miss.
    pub async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.cache.get(key).await.ok()??;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    provider = self.provider_name,
                    key, "stale cache shape, treating as miss: {e}"
                );
                None
            }
        }
    }

    /// Cache write; serialization failures are logged, never propagated
    pub async fn cache_set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_config_key: &str,
        default_ttl: i64,
    ) {
        let ttl = self.ttl(ttl_config_key, default_ttl).await;
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(provider = self.provider_name, key, "cache serialization failed: {e}");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .set(key, &json, ttl, Some(self.provider_name))
            .await
        {
            warn!(provider = self.provider_name, key, "cache write failed: {e}");
        }
    }

    /// The cache key for a search, including the optional episode hint
    pub fn search_cache_key(&self, keyword: &str, hint: Option<(u32, u32)>) -> String {
        match hint {
            Some((season, episode)) => {
                format!(
                    "search_{}_{}_s{:02}e{:02}",
                    self.provider_name, keyword, season, episode
                )
            }
            None => format!("search_{}_{}", self.provider_name, keyword),
        }
    }

    /// The cache key for a full episode listing
    pub fn episodes_cache_key(&self, media_id: &str) -> String {
        format!("episodes_{media_id}")
    }

    /// True when the title trips the built-in junk pattern or the
    /// user-configured `<provider>_episode_blacklist_regex`. Both filters
    /// apply to search results and to episode listings.
    pub async fn is_blacklisted(&self, title: &str) -> bool {
        if let Some(pattern) = &self.builtin_blacklist {
            if pattern.is_match(title) {
                return true;
            }
        }

        let key = format!("{}_episode_blacklist_regex", self.provider_name);
        let user_pattern = match self.config.get(&key, "").await {
            Ok(p) => p,
            Err(_) => return false,
        };
        if user_pattern.is_empty() {
            return false;
        }
        match Regex::new(&user_pattern) {
            Ok(regex) => regex.is_match(title),
            Err(e) => {
                warn!(provider = self.provider_name, "bad user blacklist regex: {e}");
                false
            }
        }
    }

    /// Per-provider config value
    pub async fn config_value(&self, key: &str, default: &str) -> Result<String, ScraperError> {
        Ok(self.config.get(key, default).await?)
    }
}
