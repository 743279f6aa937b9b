//! Anime entity
//!
//! The library's unit of organization: one series-season or one movie.
//! Owns its metadata row, its aliases row, and any number of sources.

use crate::domain::value_objects::WorkType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anime entity - one work in the local library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anime {
    /// Unique identifier
    pub id: i64,
    /// Display title; stored with fullwidth colons
    pub title: String,
    /// Work type
    pub work_type: WorkType,
    /// Season number (0 allowed for specials)
    pub season: i32,
    /// Remote poster URL
    pub image_url: Option<String>,
    /// Locally cached poster path
    pub local_image_path: Option<String>,
    /// Explicit episode count, when known
    pub episode_count: Option<i32>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// External ids attached to an anime (1:1).
///
/// Every field is write-if-empty: once set non-empty only explicit user
/// edits may change it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnimeMetadata {
    pub anime_id: i64,
    pub tmdb_id: Option<String>,
    pub tmdb_episode_group_id: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
    pub douban_id: Option<String>,
    pub bangumi_id: Option<String>,
}

/// Alternative titles attached to an anime (1:1), same write-if-empty rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnimeAliases {
    pub anime_id: i64,
    pub name_en: Option<String>,
    pub name_jp: Option<String>,
    pub name_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
}

impl AnimeAliases {
    /// All non-empty aliases as a flat list
    pub fn all(&self) -> Vec<&str> {
        [
            self.name_en.as_deref(),
            self.name_jp.as_deref(),
            self.name_romaji.as_deref(),
            self.alias_cn_1.as_deref(),
            self.alias_cn_2.as_deref(),
            self.alias_cn_3.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect()
    }
}
