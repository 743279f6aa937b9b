//! Scraper admin handlers
//!
//! Settings, per-provider configuration restricted to declared keys, and
//! the auxiliary action dispatch (login flows, URL parsing).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::entities::ScraperSetting;
use crate::presentation::http::handlers::error_response;
use crate::presentation::http::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperSettingView {
    pub provider_name: String,
    pub is_enabled: bool,
    pub display_order: i32,
    pub use_proxy: bool,
    pub configurable_fields: HashMap<String, String>,
    pub is_loggable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperSettingBody {
    pub provider_name: String,
    pub is_enabled: bool,
    pub display_order: i32,
    pub use_proxy: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActionBody {
    pub action: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// `GET /api/ui/scrapers`
pub async fn list_scrapers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let settings = state
        .settings_repo
        .all_scraper_settings()
        .await
        .map_err(|e| error_response(e.into()))?;

    let mut views = Vec::with_capacity(settings.len());
    for setting in settings {
        let (configurable_fields, is_loggable) =
            match state.registry.get(&setting.provider_name) {
                Ok(scraper) => (
                    scraper.configurable_fields().into_iter().collect(),
                    scraper.is_loggable(),
                ),
                Err(_) => (HashMap::new(), false),
            };
        views.push(ScraperSettingView {
            provider_name: setting.provider_name,
            is_enabled: setting.is_enabled,
            display_order: setting.display_order,
            use_proxy: setting.use_proxy,
            configurable_fields,
            is_loggable,
        });
    }
    Ok(Json(views))
}

/// `PUT /api/ui/scrapers` - bulk settings update
pub async fn update_scrapers(
    State(state): State<AppState>,
    Json(body): Json<Vec<ScraperSettingBody>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let settings: Vec<ScraperSetting> = body
        .into_iter()
        .map(|s| ScraperSetting {
            provider_name: s.provider_name,
            is_enabled: s.is_enabled,
            display_order: s.display_order,
            use_proxy: s.use_proxy,
        })
        .collect();
    state
        .settings_repo
        .update_scraper_settings(&settings)
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/ui/scrapers/{provider}/config` - values of the declared keys
pub async fn get_scraper_config(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scraper = state
        .registry
        .get(&provider)
        .map_err(|e| error_response(e.into()))?;

    let mut values = HashMap::new();
    for (key, _label) in scraper.configurable_fields() {
        let value = state
            .config_repo
            .get(&key, "")
            .await
            .map_err(|e| error_response(e.into()))?;
        values.insert(key, value);
    }
    // The response-logging switch is always configurable for loggable
    // scrapers
    if scraper.is_loggable() {
        let key = format!("scraper_{provider}_log_responses");
        let value = state
            .config_repo
            .get(&key, "false")
            .await
            .map_err(|e| error_response(e.into()))?;
        values.insert(key, value);
    }
    let blacklist_key = format!("{provider}_episode_blacklist_regex");
    let value = state
        .config_repo
        .get(&blacklist_key, "")
        .await
        .map_err(|e| error_response(e.into()))?;
    values.insert(blacklist_key, value);

    Ok(Json(values))
}

/// `PUT /api/ui/scrapers/{provider}/config` - unknown keys are rejected
pub async fn update_scraper_config(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<HashMap<String, String>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scraper = state
        .registry
        .get(&provider)
        .map_err(|e| error_response(e.into()))?;

    let mut recognized: Vec<String> = scraper
        .configurable_fields()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    if scraper.is_loggable() {
        recognized.push(format!("scraper_{provider}_log_responses"));
    }
    recognized.push(format!("{provider}_episode_blacklist_regex"));
    recognized.push(format!("{provider}_user_agent"));

    for key in body.keys() {
        if !recognized.contains(key) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("'{key}' is not a recognized config key for {provider}"),
            ));
        }
    }

    for (key, value) in &body {
        state
            .config_repo
            .set(key, value)
            .await
            .map_err(|e| error_response(e.into()))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/ui/scrapers/{provider}/action` - auxiliary operations
pub async fn execute_scraper_action(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<ActionBody>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scraper = state
        .registry
        .get(&provider)
        .map_err(|e| error_response(e.into()))?;

    let result = scraper
        .execute_action(&body.action, body.payload)
        .await
        .map_err(|e| match e {
            crate::shared::error::ScraperError::ActionNotImplemented(_) => {
                (StatusCode::NOT_IMPLEMENTED, e.to_string())
            }
            other => error_response(other.into()),
        })?;
    Ok(Json(result))
}
