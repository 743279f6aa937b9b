//! Task API handlers
//!
//! History listing and the pause/resume/abort/delete controls. Invalid
//! state transitions surface as 409.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub search: Option<String>,
    #[serde(default = "default_status_filter")]
    pub status: String,
}

fn default_status_filter() -> String {
    "all".to_string()
}

/// `GET /api/ui/tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tasks = state
        .task_repo
        .list(query.search.as_deref(), &query.status)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(tasks))
}

/// `GET /api/ui/tasks/{task_id}`
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let task = state
        .task_repo
        .find_by_id(&task_id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or((StatusCode::NOT_FOUND, "task not found".to_string()))?;
    Ok(Json(task))
}

/// `POST /api/ui/tasks/{task_id}/pause`
pub async fn pause_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .task_manager
        .pause(&task_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ui/tasks/{task_id}/resume`
pub async fn resume_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .task_manager
        .resume(&task_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ui/tasks/{task_id}/abort`
pub async fn abort_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .task_manager
        .abort(&task_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/ui/tasks/{task_id}` - idempotent
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .task_manager
        .delete(&task_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
