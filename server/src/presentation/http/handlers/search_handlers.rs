//! Provider search handlers
//!
//! Admin-side search across the enabled scrapers, plus episode listing
//! preview before an import.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::domain::value_objects::WorkType;
use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProviderSearchQuery {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct EpisodePreviewQuery {
    pub provider: String,
    pub media_id: String,
    pub media_type: Option<String>,
}

/// `GET /api/ui/search/provider?keyword=...`
pub async fn search_provider(
    State(state): State<AppState>,
    Query(query): Query<ProviderSearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = state
        .search_use_case
        .execute(&query.keyword)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

/// `GET /api/ui/search/episodes?provider=...&media_id=...`
pub async fn preview_episodes(
    State(state): State<AppState>,
    Query(query): Query<EpisodePreviewQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scraper = state
        .registry
        .get(&query.provider)
        .map_err(|e| error_response(e.into()))?;
    let media_type = query
        .media_type
        .as_deref()
        .map(WorkType::from_str)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let episodes = scraper
        .get_episodes(&query.media_id, None, media_type)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(episodes))
}
