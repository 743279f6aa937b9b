//! Application services

pub mod metadata_manager;
pub mod webhooks;

pub use metadata_manager::{MetadataSourceManager, MetadataSourceStatus};
pub use webhooks::{LibraryImportWebhook, WebhookHandler, WebhookRegistry};
