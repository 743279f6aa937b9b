//! Scraper registry
//!
//! Holds the discovered scraper instances and keeps the `scrapers` table in
//! step with them. Operator flags (enable, order, proxy) live in the table;
//! the registry reads them back for ordered fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::SettingsRepository;
use crate::interfaces::scrapers::Scraper;
use crate::shared::error::ScraperError;

/// Registry of discovered scrapers
pub struct ScraperRegistry {
    scrapers: HashMap<&'static str, Arc<dyn Scraper>>,
    settings: Arc<dyn SettingsRepository>,
}

impl ScraperRegistry {
    /// Registers the discovered scrapers and syncs them to the database,
    /// preserving operator flags and appending new providers at the end of
    /// the display order
    pub async fn initialize(
        discovered: Vec<Arc<dyn Scraper>>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Result<Self, ScraperError> {
        let mut scrapers = HashMap::new();
        for scraper in discovered {
            scrapers.insert(scraper.provider_name(), scraper);
        }

        let names: Vec<&str> = scrapers.keys().copied().collect();
        settings.sync_scrapers(&names).await?;
        info!("scraper registry initialized with {} providers", scrapers.len());

        Ok(Self { scrapers, settings })
    }

    /// Looks up one scraper by provider name
    pub fn get(&self, provider_name: &str) -> Result<Arc<dyn Scraper>, ScraperError> {
        self.scrapers
            .get(provider_name)
            .cloned()
            .ok_or_else(|| ScraperError::UnknownProvider(provider_name.to_string()))
    }

    /// Every registered scraper, unordered
    pub fn all(&self) -> Vec<Arc<dyn Scraper>> {
        self.scrapers.values().cloned().collect()
    }

    /// Enabled scrapers in display order, for search fan-out
    pub async fn enabled_in_order(&self) -> Result<Vec<Arc<dyn Scraper>>, ScraperError> {
        let settings = self.settings.all_scraper_settings().await?;
        let mut ordered = Vec::new();
        for setting in settings {
            if !setting.is_enabled {
                continue;
            }
            if let Some(scraper) = self.scrapers.get(setting.provider_name.as_str()) {
                ordered.push(scraper.clone());
            }
        }
        Ok(ordered)
    }

    /// Display order per provider, for final result sorting
    pub async fn display_orders(&self) -> Result<HashMap<String, i32>, ScraperError> {
        let settings = self.settings.all_scraper_settings().await?;
        Ok(settings
            .into_iter()
            .map(|s| (s.provider_name, s.display_order))
            .collect())
    }

    /// Whether at least one scraper is enabled
    pub async fn has_enabled(&self) -> Result<bool, ScraperError> {
        Ok(!self.enabled_in_order().await?.is_empty())
    }

    /// Closes every scraper's pooled connections
    pub async fn close_all(&self) {
        for scraper in self.scrapers.values() {
            scraper.close().await;
        }
    }
}
