//! Scheduled job families
//!
//! Implementations of the [`Job`] contract the scheduler submits to the
//! task engine.

pub mod incremental_refresh;
pub mod tmdb_mapping_refresh;

pub use crate::interfaces::jobs::Job;
pub use incremental_refresh::IncrementalRefreshJob;
pub use tmdb_mapping_refresh::TmdbMappingRefreshJob;
