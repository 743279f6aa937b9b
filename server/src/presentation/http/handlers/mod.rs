//! HTTP handlers

pub mod compat_handlers;
pub mod library_handlers;
pub mod scheduled_task_handlers;
pub mod scraper_handlers;
pub mod search_handlers;
pub mod settings_handlers;
pub mod task_handlers;
pub mod webhook_handlers;

use axum::http::StatusCode;

use crate::shared::error::ApplicationError;

/// Maps application errors onto the HTTP boundary
pub fn error_response(err: ApplicationError) -> (StatusCode, String) {
    let status = match &err {
        ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
        ApplicationError::Conflict(_) => StatusCode::CONFLICT,
        ApplicationError::Configuration(_) => StatusCode::BAD_REQUEST,
        ApplicationError::Scheduler(_) => StatusCode::BAD_REQUEST,
        ApplicationError::Repository(crate::shared::error::RepositoryError::Duplicate(_)) => {
            StatusCode::CONFLICT
        }
        ApplicationError::Repository(crate::shared::error::RepositoryError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}
