//! Provider setting entities
//!
//! Rows of the `scrapers` and `metadata_sources` tables. Display order
//! drives search fan-out ordering and match tie-breaking.

use serde::{Deserialize, Serialize};

/// Per-scraper persisted settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScraperSetting {
    pub provider_name: String,
    pub is_enabled: bool,
    pub display_order: i32,
    pub use_proxy: bool,
}

/// Per-metadata-source persisted settings.
///
/// `is_aux_search_enabled` is forced true for tmdb whenever the source is
/// enabled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataSourceSetting {
    pub provider_name: String,
    pub is_enabled: bool,
    pub is_aux_search_enabled: bool,
    pub display_order: i32,
    pub use_proxy: bool,
}
