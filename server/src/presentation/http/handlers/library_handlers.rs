//! Library management handlers
//!
//! Everything the admin UI does to works, sources, and episodes. Long
//! operations go through the task engine; the handler returns the task id.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::application::use_cases::ImportRequest;
use crate::domain::repositories::{AnimeDetailsUpdate, ExternalIds};
use crate::domain::value_objects::WorkType;
use crate::interfaces::progress::ProgressSink;
use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmitted {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBody {
    pub provider: String,
    pub media_id: String,
    pub anime_title: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub season: Option<i32>,
    pub current_episode_index: Option<i32>,
    pub image_url: Option<String>,
    pub tmdb_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeEditBody {
    pub title: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub season: i32,
    pub episode_count: Option<i32>,
    pub image_url: Option<String>,
    pub tmdb_id: Option<String>,
    pub tmdb_episode_group_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<String>,
    pub name_en: Option<String>,
    pub name_jp: Option<String>,
    pub name_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeEditBody {
    pub title: String,
    pub episode_index: i32,
    pub source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassociateBody {
    pub target_anime_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSourcesBody {
    pub source_ids: Vec<i64>,
}

/// `GET /api/ui/library`
pub async fn get_library(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entries = state
        .anime_repo
        .list_library()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(entries))
}

/// `GET /api/ui/library/{anime_id}`
pub async fn get_anime_details(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let details = state
        .anime_repo
        .full_details(anime_id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or((StatusCode::NOT_FOUND, "anime not found".to_string()))?;
    Ok(Json(details))
}

/// `PUT /api/ui/library/{anime_id}`
pub async fn edit_anime(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
    Json(body): Json<AnimeEditBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let work_type = WorkType::from_str(&body.media_type)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let update = AnimeDetailsUpdate {
        title: body.title,
        work_type,
        season: body.season,
        episode_count: body.episode_count,
        image_url: body.image_url,
        tmdb_id: body.tmdb_id,
        tmdb_episode_group_id: body.tmdb_episode_group_id,
        imdb_id: body.imdb_id,
        tvdb_id: body.tvdb_id,
        douban_id: body.douban_id,
        bangumi_id: body.bangumi_id,
        name_en: body.name_en,
        name_jp: body.name_jp,
        name_romaji: body.name_romaji,
        alias_cn_1: body.alias_cn_1,
        alias_cn_2: body.alias_cn_2,
        alias_cn_3: body.alias_cn_3,
    };

    let updated = state
        .anime_repo
        .update_details(anime_id, &update)
        .await
        .map_err(|e| error_response(e.into()))?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "anime not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/ui/library/{anime_id}` - runs as a task
pub async fn delete_anime(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let anime_repo = state.anime_repo.clone();
    let task_id = state
        .task_manager
        .submit(
            &format!("Delete anime {anime_id}"),
            Box::new(move |progress| {
                Box::pin(async move {
                    progress.report(10, "deleting library entry").await?;
                    let deleted = anime_repo.delete(anime_id).await?;
                    Ok(if deleted {
                        "anime deleted".to_string()
                    } else {
                        "anime was already gone".to_string()
                    })
                })
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `POST /api/ui/import` - import a provider search result
pub async fn import_from_provider(
    State(state): State<AppState>,
    Json(body): Json<ImportBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let work_type = WorkType::from_str(&body.media_type)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let request = ImportRequest {
        provider: body.provider.clone(),
        media_id: body.media_id,
        anime_title: body.anime_title.clone(),
        work_type,
        season: body.season.unwrap_or(1),
        current_episode_index: body.current_episode_index,
        image_url: body.image_url,
        external_ids: ExternalIds {
            tmdb_id: body.tmdb_id,
            imdb_id: body.imdb_id,
            tvdb_id: body.tvdb_id,
            douban_id: body.douban_id,
            bangumi_id: body.bangumi_id,
        },
    };

    let import = state.import_use_case.clone();
    let title = format!("Import: {} ({})", body.anime_title, body.provider);
    let task_id = state
        .task_manager
        .submit(
            &title,
            Box::new(move |progress| {
                Box::pin(async move { import.execute(&request, progress.as_ref()).await })
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `GET /api/ui/library/{anime_id}/sources`
pub async fn get_sources(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sources = state
        .source_repo
        .list_for_anime(anime_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(sources))
}

/// `POST /api/ui/library/{anime_id}/reassociate`
pub async fn reassociate_sources(
    State(state): State<AppState>,
    Path(anime_id): Path<i64>,
    Json(body): Json<ReassociateBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if anime_id == body.target_anime_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "cannot reassociate an anime onto itself".to_string(),
        ));
    }
    let moved = state
        .source_repo
        .reassociate(anime_id, body.target_anime_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    if !moved {
        return Err((StatusCode::NOT_FOUND, "anime not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/ui/sources/{source_id}/favorite`
pub async fn toggle_source_favorite(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let favorited = state
        .source_repo
        .toggle_favorite(source_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(serde_json::json!({ "isFavorited": favorited })))
}

/// `PUT /api/ui/sources/{source_id}/incremental-refresh`
pub async fn toggle_source_incremental_refresh(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let enabled = state
        .source_repo
        .toggle_incremental_refresh(source_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(
        serde_json::json!({ "incrementalRefreshEnabled": enabled }),
    ))
}

/// `POST /api/ui/sources/{source_id}/refresh` - full refresh task
pub async fn refresh_source(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let details = state
        .source_repo
        .details(source_id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or((StatusCode::NOT_FOUND, "source not found".to_string()))?;

    let refresh = state.refresh_use_case.clone();
    let title = format!("Refresh: {} ({})", details.title, details.provider_name);
    let task_id = state
        .task_manager
        .submit(
            &title,
            Box::new(move |progress| {
                Box::pin(
                    async move { refresh.full_refresh(source_id, progress.as_ref()).await },
                )
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `DELETE /api/ui/sources/{source_id}` - runs as a task
pub async fn delete_source(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let source_repo = state.source_repo.clone();
    let task_id = state
        .task_manager
        .submit(
            &format!("Delete source {source_id}"),
            Box::new(move |progress| {
                Box::pin(async move {
                    progress.report(10, "deleting source").await?;
                    let deleted = source_repo.delete(source_id).await?;
                    Ok(if deleted {
                        "source deleted".to_string()
                    } else {
                        "source was already gone".to_string()
                    })
                })
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `POST /api/ui/sources/bulk-delete` - runs as one task
pub async fn delete_bulk_sources(
    State(state): State<AppState>,
    Json(body): Json<BulkSourcesBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let source_repo = state.source_repo.clone();
    let total = body.source_ids.len();
    let task_id = state
        .task_manager
        .submit(
            &format!("Bulk delete {total} sources"),
            Box::new(move |progress| {
                Box::pin(async move {
                    let mut deleted = 0usize;
                    for (i, source_id) in body.source_ids.iter().enumerate() {
                        let percent = ((i as f64 / total.max(1) as f64) * 100.0) as i32;
                        progress
                            .report(percent, &format!("deleting source {}/{}", i + 1, total))
                            .await?;
                        if source_repo.delete(*source_id).await? {
                            deleted += 1;
                        }
                    }
                    Ok(format!("bulk delete finished, {deleted}/{total} sources removed"))
                })
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `GET /api/ui/sources/{source_id}/episodes`
pub async fn get_source_episodes(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let episodes = state
        .episode_repo
        .list_for_source(source_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(episodes))
}

/// `POST /api/ui/sources/{source_id}/reorder` - renumber as a task
pub async fn reorder_source_episodes(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let refresh = state.refresh_use_case.clone();
    let task_id = state
        .task_manager
        .submit(
            &format!("Reorder episodes of source {source_id}"),
            Box::new(move |progress| {
                Box::pin(async move {
                    refresh.reorder_episodes(source_id, progress.as_ref()).await
                })
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `PUT /api/ui/episodes/{episode_id}`
pub async fn edit_episode(
    State(state): State<AppState>,
    Path(episode_id): Path<i64>,
    Json(body): Json<EpisodeEditBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if body.episode_index < 1 {
        return Err((
            StatusCode::BAD_REQUEST,
            "episode index must be positive".to_string(),
        ));
    }

    let updated = state
        .episode_repo
        .update_info(
            episode_id,
            &body.title,
            body.episode_index,
            body.source_url.as_deref(),
        )
        .await
        .map_err(|e| error_response(e.into()))?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "episode not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ui/episodes/{episode_id}/refresh` - delta refresh task
pub async fn refresh_episode(
    State(state): State<AppState>,
    Path(episode_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let refresh = state.refresh_use_case.clone();
    let task_id = state
        .task_manager
        .submit(
            &format!("Refresh episode {episode_id}"),
            Box::new(move |progress| {
                Box::pin(async move {
                    refresh.refresh_episode(episode_id, progress.as_ref()).await
                })
            }),
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::ACCEPTED, Json(TaskSubmitted { task_id })))
}

/// `DELETE /api/ui/episodes/{episode_id}`
pub async fn delete_episode(
    State(state): State<AppState>,
    Path(episode_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deleted = state
        .episode_repo
        .delete(episode_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "episode not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct LibrarySearchQuery {
    pub keyword: String,
}

/// `GET /api/ui/library/search?keyword=...` - admin-side library search
pub async fn search_library(
    State(state): State<AppState>,
    Query(query): Query<LibrarySearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let hits = state
        .match_use_case
        .search_library(&query.keyword)
        .await
        .map_err(error_response)?;
    Ok(Json(hits))
}
