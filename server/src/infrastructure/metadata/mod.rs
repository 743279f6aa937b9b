//! Metadata provider adapters

pub mod bangumi;
pub mod tmdb;

pub use bangumi::BangumiClient;
pub use tmdb::TmdbClient;
