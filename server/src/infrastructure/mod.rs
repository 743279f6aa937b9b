//! Infrastructure layer - concrete adapters for storage, upstream sites,
//! metadata providers, and background execution

pub mod database;
pub mod maintenance;
pub mod metadata;
pub mod persistence;
pub mod scrapers;
pub mod tasks;
