//! Interface layer - contracts between the core and its adapters

pub mod jobs;
pub mod metadata;
pub mod progress;
pub mod scrapers;
