//! TMDB metadata adapter
//!
//! Alias search for the pipeline's filter, plus episode-group fetching and
//! the materialization rules behind the season-override mapping table.

pub mod client;
pub mod dto;
pub mod mapper;

pub use client::TmdbClient;
pub use dto::{EpisodeGroupDetails, EpisodeGroupSummary};
pub use mapper::materialize_group_mappings;
