//! Settings handlers
//!
//! Metadata-source settings, API tokens, UA rules, config get/put, and
//! cache administration.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Deserialize;

use crate::domain::entities::MetadataSourceSetting;
use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

/// Config keys the generic get/put endpoint may touch
const EDITABLE_CONFIG_KEYS: [&str; 13] = [
    "search_ttl_seconds",
    "episodes_ttl_seconds",
    "base_info_ttl_seconds",
    "metadata_search_ttl_seconds",
    "webhook_api_key",
    "proxy_url",
    "proxy_enabled",
    "tmdb_api_key",
    "tmdb_api_base_url",
    "tmdb_image_base_url",
    "bangumi_client_id",
    "bangumi_client_secret",
    "incremental_refresh_failure_threshold",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSettingBody {
    pub provider_name: String,
    pub is_enabled: bool,
    pub is_aux_search_enabled: bool,
    pub display_order: i32,
    pub use_proxy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreateBody {
    pub name: String,
    /// "permanent", "1d", "7d", "30d", "180d", "365d"
    #[serde(default = "default_validity")]
    pub validity_period: String,
}

fn default_validity() -> String {
    "permanent".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UaRuleBody {
    pub ua_string: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfigValueBody {
    pub value: String,
}

/// `GET /api/ui/metadata-sources`
pub async fn list_metadata_sources(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sources = state
        .metadata_manager
        .sources_with_status()
        .await
        .map_err(error_response)?;
    Ok(Json(sources))
}

/// `PUT /api/ui/metadata-sources`
pub async fn update_metadata_sources(
    State(state): State<AppState>,
    Json(body): Json<Vec<MetadataSettingBody>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let settings: Vec<MetadataSourceSetting> = body
        .into_iter()
        .map(|s| MetadataSourceSetting {
            provider_name: s.provider_name,
            is_enabled: s.is_enabled,
            is_aux_search_enabled: s.is_aux_search_enabled,
            display_order: s.display_order,
            use_proxy: s.use_proxy,
        })
        .collect();
    state
        .settings_repo
        .update_metadata_settings(&settings)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/ui/tokens`
pub async fn list_tokens(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tokens = state
        .auth_repo
        .list_tokens()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(tokens))
}

/// `POST /api/ui/tokens`
pub async fn create_token(
    State(state): State<AppState>,
    Json(body): Json<TokenCreateBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let expires_at = match body.validity_period.as_str() {
        "permanent" => None,
        period => {
            let days: i64 = period
                .strip_suffix('d')
                .and_then(|d| d.parse().ok())
                .ok_or((
                    StatusCode::BAD_REQUEST,
                    format!("unknown validity period '{period}'"),
                ))?;
            Some(Utc::now() + Duration::days(days))
        }
    };

    let token = generate_token();
    let id = state
        .auth_repo
        .create_token(&body.name, &token, expires_at)
        .await
        .map_err(|e| error_response(e.into()))?;
    let created = state
        .auth_repo
        .find_token_by_id(id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/ui/tokens/{id}/toggle`
pub async fn toggle_token(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let enabled = state
        .auth_repo
        .toggle_token(id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or((StatusCode::NOT_FOUND, "token not found".to_string()))?;
    Ok(Json(serde_json::json!({ "isEnabled": enabled })))
}

/// `DELETE /api/ui/tokens/{id}`
pub async fn delete_token(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deleted = state
        .auth_repo
        .delete_token(id)
        .await
        .map_err(|e| error_response(e.into()))?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "token not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/ui/ua-rules`
pub async fn list_ua_rules(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let rules = state
        .auth_repo
        .list_ua_rules()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(rules))
}

/// `POST /api/ui/ua-rules`
pub async fn add_ua_rule(
    State(state): State<AppState>,
    Json(body): Json<UaRuleBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if body.ua_string.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "empty UA string".to_string()));
    }
    let id = state
        .auth_repo
        .add_ua_rule(body.ua_string.trim())
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// `DELETE /api/ui/ua-rules/{id}`
pub async fn delete_ua_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let deleted = state
        .auth_repo
        .delete_ua_rule(id)
        .await
        .map_err(|e| error_response(e.into()))?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "rule not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/ui/config/{key}`
pub async fn get_config_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !EDITABLE_CONFIG_KEYS.contains(&key.as_str()) {
        return Err((StatusCode::NOT_FOUND, format!("unknown config key '{key}'")));
    }
    let value = state
        .config_repo
        .get(&key, "")
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(serde_json::json!({ "key": key, "value": value })))
}

/// `PUT /api/ui/config/{key}`
pub async fn set_config_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<ConfigValueBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !EDITABLE_CONFIG_KEYS.contains(&key.as_str()) {
        return Err((StatusCode::NOT_FOUND, format!("unknown config key '{key}'")));
    }
    state
        .config_repo
        .set(&key, &body.value)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ui/config/webhook-key/regenerate`
pub async fn regenerate_webhook_key(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let key = generate_token();
    state
        .config_repo
        .set("webhook_api_key", &key)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(serde_json::json!({ "webhookApiKey": key })))
}

/// `POST /api/ui/cache/clear`
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let removed = state
        .cache_repo
        .clear_all()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

/// `GET /api/ui/tmdb/tv/{tv_id}/episode-groups`
pub async fn list_tmdb_episode_groups(
    State(state): State<AppState>,
    Path(tv_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let groups = state
        .tmdb
        .episode_groups(tv_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(groups))
}

/// `GET /api/ui/tmdb/episode-groups/{group_id}`
pub async fn get_tmdb_episode_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let details = state
        .tmdb
        .episode_group_details(&group_id)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(details))
}

/// Random 32-hex-char secret
fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
