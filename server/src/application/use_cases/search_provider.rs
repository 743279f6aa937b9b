//! Provider search pipeline
//!
//! Turns a free-form keyword into a ranked candidate list:
//!
//! 1. Parse the keyword into `(title, season, episode)`.
//! 2. Fan out to every enabled scraper concurrently, bounded per call.
//! 3. Filter by the union of metadata-source aliases, when available.
//! 4. Rewrite obviously-movie titles reported as series.
//! 5. Apply the parsed season filter and echo the parsed episode.
//! 6. Sort by scraper display order.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::services::MetadataSourceManager;
use crate::domain::value_objects::WorkType;
use crate::infrastructure::scrapers::ScraperRegistry;
use crate::interfaces::scrapers::{EpisodeHint, SearchCandidate};
use crate::shared::error::ApplicationError;
use crate::shared::text::TitleNormalizer;

/// Per-scraper search deadline inside the fan-out
const SEARCH_DEADLINE: Duration = Duration::from_secs(30);

/// Titles carrying these markers are movies no matter what the provider
/// claims
const MOVIE_KEYWORDS: [&str; 4] = ["剧场版", "劇場版", "movie", "映画"];

/// The pipeline's result, echoing what was parsed from the keyword
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSearchOutcome {
    pub results: Vec<SearchCandidate>,
    pub search_season: Option<u32>,
    pub search_episode: Option<u32>,
}

/// Search-and-match pipeline over the enabled scrapers
pub struct SearchProviderUseCase {
    registry: Arc<ScraperRegistry>,
    metadata_manager: Arc<MetadataSourceManager>,
}

impl SearchProviderUseCase {
    pub fn new(
        registry: Arc<ScraperRegistry>,
        metadata_manager: Arc<MetadataSourceManager>,
    ) -> Self {
        Self {
            registry,
            metadata_manager,
        }
    }

    pub async fn execute(&self, keyword: &str) -> Result<ProviderSearchOutcome, ApplicationError> {
        let parsed = keyword_parser::parse(keyword);
        info!(
            keyword,
            title = %parsed.title,
            season = ?parsed.season,
            episode = ?parsed.episode,
            "provider search"
        );

        let scrapers = self.registry.enabled_in_order().await?;
        if scrapers.is_empty() {
            return Err(ApplicationError::Configuration(
                "no enabled search sources; enable at least one scraper".to_string(),
            ));
        }

        let hint = parsed.episode.map(|episode| EpisodeHint {
            season: parsed.season,
            episode: Some(episode),
        });

        // Fan out concurrently; a failing or slow scraper contributes an
        // empty list, never an error
        let searches = scrapers.iter().map(|scraper| {
            let scraper = scraper.clone();
            let title = parsed.title.clone();
            let hint = hint;
            async move {
                match tokio::time::timeout(SEARCH_DEADLINE, async {
                    scraper.search(&title, hint.as_ref()).await
                })
                .await
                {
                    Ok(results) => results,
                    Err(_) => {
                        warn!(provider = scraper.provider_name(), "search timed out");
                        Vec::new()
                    }
                }
            }
        });
        let mut results: Vec<SearchCandidate> =
            join_all(searches).await.into_iter().flatten().collect();

        // Alias filter, only when an auxiliary source produced something
        let aliases = self.metadata_manager.search_aliases(&parsed.title).await;
        if !aliases.is_empty() {
            let mut normalized_aliases: Vec<String> = aliases
                .iter()
                .map(|a| TitleNormalizer::normalize_for_filtering(a))
                .filter(|a| !a.is_empty())
                .collect();
            normalized_aliases.push(TitleNormalizer::normalize_for_filtering(&parsed.title));

            let before = results.len();
            results.retain(|candidate| {
                let title = TitleNormalizer::normalize_for_filtering(&candidate.title);
                if title.is_empty() {
                    return false;
                }
                normalized_aliases
                    .iter()
                    .any(|alias| alias.contains(&title) || title.contains(alias.as_str()))
            });
            info!(before, after = results.len(), "alias filter applied");
        }

        // Type correction: providers love to tag theatrical cuts as series
        for candidate in &mut results {
            if candidate.work_type == WorkType::TvSeries && is_movie_by_title(&candidate.title) {
                candidate.work_type = WorkType::Movie;
            }
        }

        // Season filter: an explicit season keeps only matching series
        if let Some(season) = parsed.season {
            results.retain(|candidate| {
                candidate.work_type == WorkType::TvSeries && candidate.season == season as i32
            });
        }

        // Episode echo: always reflect this request, never a cached one
        let echo = parsed.episode.map(|e| e as i32);
        for candidate in &mut results {
            candidate.current_episode_index = echo;
        }

        // Final ordering is the operator-set display order
        let orders = self.registry.display_orders().await?;
        results.sort_by_key(|candidate| {
            orders.get(candidate.provider.as_str()).copied().unwrap_or(i32::MAX)
        });

        Ok(ProviderSearchOutcome {
            results,
            search_season: parsed.season,
            search_episode: parsed.episode,
        })
    }
}

fn is_movie_by_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    MOVIE_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_keywords_match_case_insensitively() {
        assert!(is_movie_by_title("名侦探柯南：黑铁的鱼影 劇場版"));
        assert!(is_movie_by_title("Detective Conan The MOVIE"));
        assert!(!is_movie_by_title("名侦探柯南"));
    }
}
