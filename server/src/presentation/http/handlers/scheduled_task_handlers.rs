//! Scheduled task handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTaskCreateBody {
    pub name: String,
    pub job_type: String,
    pub cron_expression: String,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTaskUpdateBody {
    pub name: String,
    pub cron_expression: String,
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTypeInfo {
    pub job_type: String,
    pub name: String,
}

/// `GET /api/ui/scheduled-tasks`
pub async fn list_scheduled_tasks(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // The scheduler owns the repository; read through it for consistency
    let tasks = state
        .scheduler
        .list_tasks()
        .await
        .map_err(error_response)?;
    Ok(Json(tasks))
}

/// `POST /api/ui/scheduled-tasks`
pub async fn create_scheduled_task(
    State(state): State<AppState>,
    Json(body): Json<ScheduledTaskCreateBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let task = state
        .scheduler
        .create_task(&body.name, &body.job_type, &body.cron_expression, body.is_enabled)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PUT /api/ui/scheduled-tasks/{id}`
pub async fn update_scheduled_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ScheduledTaskUpdateBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .scheduler
        .update_task(&id, &body.name, &body.cron_expression, body.is_enabled)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/ui/scheduled-tasks/{id}`
pub async fn delete_scheduled_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deleted = state
        .scheduler
        .delete_task(&id)
        .await
        .map_err(error_response)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "scheduled task not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ui/scheduled-tasks/{id}/run`
pub async fn run_scheduled_task_now(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let task_id = state.scheduler.run_now(&id).await.map_err(error_response)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "taskId": task_id })),
    ))
}

/// `GET /api/ui/scheduled-tasks/job-types`
pub async fn available_job_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let types: Vec<JobTypeInfo> = state
        .scheduler
        .available_job_types()
        .into_iter()
        .map(|(job_type, name)| JobTypeInfo { job_type, name })
        .collect();
    Ok(Json(types))
}
