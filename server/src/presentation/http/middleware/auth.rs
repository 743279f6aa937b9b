//! Authentication middleware
//!
//! Two gates in front of the compatibility API:
//!
//! - The User-Agent denylist: any rule matching the incoming `User-Agent`
//!   as a substring gets a 403.
//! - API tokens: the request must carry a token (query `api_key` or
//!   `Authorization: Bearer ...`) that is enabled and unexpired.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::presentation::http::state::AppState;

fn extract_token(req: &Request<Body>) -> Option<String> {
    if let Some(query) = req.uri().query() {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("api_key=") {
                return Some(value.to_string());
            }
        }
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

/// User-Agent denylist, applied to every route
pub async fn ua_filter_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !user_agent.is_empty() {
        let rules = state
            .auth_repo
            .list_ua_rules()
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if rules.iter().any(|rule| user_agent.contains(&rule.ua_string)) {
            warn!(%user_agent, "request blocked by UA rule");
            return Err(StatusCode::FORBIDDEN);
        }
    }

    Ok(next.run(req).await)
}

/// API-token check for the player-facing routes
pub async fn token_auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(token) = extract_token(&req) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.auth_repo.validate_token(&token).await {
        Ok(Some(_)) => Ok(next.run(req).await),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            warn!("token validation failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
