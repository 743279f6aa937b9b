//! Metadata source contract
//!
//! Metadata sources supply titles, aliases, and external ids; they never
//! supply comments. Their alias sets feed the search pipeline's filter.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::shared::error::MetadataError;

/// Connectivity/config status of a metadata source, shown in the admin UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Required configuration is present
    Configured,
    /// Required configuration is missing
    NotConfigured,
    /// Reachability probe succeeded
    Reachable,
    /// Reachability probe failed
    Unreachable,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Configured => "configured",
            SourceStatus::NotConfigured => "not_configured",
            SourceStatus::Reachable => "reachable",
            SourceStatus::Unreachable => "unreachable",
        }
    }
}

/// Contract implemented by every metadata provider
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Stable provider key
    fn provider_name(&self) -> &'static str;

    /// Config keys this source reads, for the admin UI
    fn config_keys(&self) -> &[&'static str] {
        &[]
    }

    /// Collects alternative titles for a keyword. An unconfigured source
    /// returns `ConfigMissing`; the manager silently skips it.
    async fn search_aliases(&self, keyword: &str) -> Result<HashSet<String>, MetadataError>;

    /// Ephemeral status, checked at startup and surfaced in the admin UI
    async fn check_status(&self) -> SourceStatus;
}
