//! Compatibility handlers
//!
//! The dandanplay-shaped read API players consume. Field names and shapes
//! are bit-compatible; everything here reads the library only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub keyword: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeInfo {
    pub anime_id: i64,
    pub anime_title: String,
    #[serde(rename = "type")]
    pub work_type: String,
    pub rating: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSearchResponse {
    pub has_more: bool,
    pub animes: Vec<AnimeInfo>,
}

#[derive(Debug, Serialize)]
pub struct CommentItem {
    pub cid: i64,
    pub p: String,
    pub m: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub count: usize,
    pub comments: Vec<CommentItem>,
}

/// `GET /api/search/anime?keyword=...`
pub async fn search_anime(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let hits = state
        .match_use_case
        .search_library(&query.keyword)
        .await
        .map_err(error_response)?;

    let animes = hits
        .into_iter()
        .map(|hit| AnimeInfo {
            anime_id: hit.anime_id,
            anime_title: hit.title,
            work_type: hit.work_type.as_str().to_string(),
            rating: 0,
            image_url: hit.image_url,
        })
        .collect();

    Ok(Json(AnimeSearchResponse {
        has_more: false,
        animes,
    }))
}

/// `GET /api/match?keyword=...`
pub async fn match_episode(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = state
        .match_use_case
        .match_episode(&query.keyword)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome))
}

/// `GET /api/comment/{episode_id}`
pub async fn get_comments(
    State(state): State<AppState>,
    Path(episode_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let exists = state
        .episode_repo
        .exists(episode_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    if !exists {
        return Err((StatusCode::NOT_FOUND, "episode not found".to_string()));
    }

    let comments = state
        .comment_repo
        .fetch(episode_id)
        .await
        .map_err(|e| error_response(e.into()))?;

    let comments: Vec<CommentItem> = comments
        .into_iter()
        .map(|c| CommentItem {
            cid: c.id,
            p: c.p,
            m: c.m,
        })
        .collect();

    Ok(Json(CommentResponse {
        count: comments.len(),
        comments,
    }))
}
