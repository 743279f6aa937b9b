//! Webhook entry point
//!
//! `POST /api/webhook/{type}?api_key=...` with a pluggable handler per
//! type. The key is compared against the persisted `webhook_api_key`;
//! unknown types are 404.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::error;

use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub api_key: String,
}

/// `POST /api/webhook/{webhook_type}`
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(webhook_type): Path<String>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let stored_key = state
        .config_repo
        .get("webhook_api_key", "")
        .await
        .map_err(|e| error_response(e.into()))?;
    if stored_key.is_empty() || query.api_key != stored_key {
        return Err((StatusCode::UNAUTHORIZED, "invalid webhook key".to_string()));
    }

    let Some(handler) = state.webhooks.get(&webhook_type) else {
        return Err((
            StatusCode::NOT_FOUND,
            format!("unknown webhook type '{webhook_type}'"),
        ));
    };

    if let Err(e) = handler.handle(payload).await {
        error!(%webhook_type, "webhook handler failed: {e}");
        return Err(error_response(e));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "webhook received" })),
    ))
}

/// `GET /api/ui/webhooks/types`
pub async fn available_webhook_types(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    Ok(Json(state.webhooks.available_types()))
}
