//! Shared error types for the application
//!
//! This module defines all error types used across the application, one enum
//! per layer, following the error taxonomy of the serving engine.

use thiserror::Error;

/// Domain errors - errors that occur in the domain layer
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

/// Repository errors - errors that occur during data access
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    RepositoryError::Duplicate(db_err.message().to_string())
                } else if db_err.is_check_violation() {
                    RepositoryError::ConstraintViolation(db_err.message().to_string())
                } else {
                    RepositoryError::Database(db_err.message().to_string())
                }
            }
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            sqlx::Error::PoolTimedOut => {
                RepositoryError::Connection("Connection pool timeout".to_string())
            }
            sqlx::Error::PoolClosed => {
                RepositoryError::Connection("Connection pool closed".to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Scraper errors - failures talking to an upstream comment source.
///
/// Scrapers never leak these past their public surface for `search`; for
/// `get_episodes`/`get_comments` they propagate so the task engine can mark
/// the task failed.
#[derive(Debug, Clone, Error)]
pub enum ScraperError {
    /// The surrounding task was aborted while this scraper was reporting
    /// progress; unwinds back to the task engine
    #[error("aborted")]
    Aborted,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Action '{0}' is not implemented by this scraper")]
    ActionNotImplemented(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScraperError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ScraperError::Network("Connection failed".to_string())
        } else {
            ScraperError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ScraperError {
    fn from(err: serde_json::Error) -> Self {
        ScraperError::Parse(err.to_string())
    }
}

/// Metadata source errors - failures talking to TMDB/Bangumi and friends
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Unknown metadata source: {0}")]
    UnknownProvider(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MetadataError::Network("Request timeout".to_string())
        } else {
            MetadataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        MetadataError::Parse(err.to_string())
    }
}

/// Task errors - how a running task ends up in the FAILED column.
///
/// `Aborted` is raised by the progress pump when the abort flag is set;
/// everything else carries the message written to the history row.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("aborted by user")]
    Aborted,

    #[error("{0}")]
    Failed(String),

    #[error("Scraper error: {0}")]
    Scraper(ScraperError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl From<ScraperError> for TaskError {
    fn from(err: ScraperError) -> Self {
        match err {
            // An abort raised inside a scraper's progress tick stays an abort
            ScraperError::Aborted => TaskError::Aborted,
            other => TaskError::Scraper(other),
        }
    }
}

/// Scheduler errors
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Application errors - errors that occur in the application layer
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Scraper error: {0}")]
    Scraper(#[from] ScraperError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
