//! SettingsRepository trait
//!
//! Persistence for the `scrapers` and `metadata_sources` tables, including
//! the discovery-time sync that preserves operator-set flags.

use async_trait::async_trait;

use crate::domain::entities::{MetadataSourceSetting, ScraperSetting};
use crate::shared::error::RepositoryError;

/// Repository for provider settings
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Upserts every discovered scraper, preserving existing
    /// enable/order/proxy flags and appending new providers at
    /// `max(display_order) + 1`. Providers present in the table but no
    /// longer discovered are removed, unless the discovered set is empty
    /// (guardrail against wiping state after a faulty build).
    async fn sync_scrapers(&self, discovered: &[&str]) -> Result<(), RepositoryError>;

    /// All scraper settings ordered by display order
    async fn all_scraper_settings(&self) -> Result<Vec<ScraperSetting>, RepositoryError>;

    /// One scraper's settings
    async fn scraper_setting(
        &self,
        provider_name: &str,
    ) -> Result<Option<ScraperSetting>, RepositoryError>;

    /// Bulk update of enable/order/proxy flags
    async fn update_scraper_settings(
        &self,
        settings: &[ScraperSetting],
    ) -> Result<(), RepositoryError>;

    /// Same sync semantics as scrapers, for metadata sources
    async fn sync_metadata_sources(&self, discovered: &[&str]) -> Result<(), RepositoryError>;

    /// All metadata source settings ordered by display order
    async fn all_metadata_settings(
        &self,
    ) -> Result<Vec<MetadataSourceSetting>, RepositoryError>;

    /// Bulk update; tmdb's aux-search flag is forced on while the source is
    /// enabled
    async fn update_metadata_settings(
        &self,
        settings: &[MetadataSourceSetting],
    ) -> Result<(), RepositoryError>;
}
