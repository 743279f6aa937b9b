//! TMDB Data Transfer Objects

use serde::{Deserialize, Serialize};

/// One entry of `/search/tv` or `/search/movie`
#[derive(Debug, Deserialize)]
pub struct SearchEntry {
    pub id: i64,
    /// TV results carry `name`, movie results carry `title`
    pub name: Option<String>,
    pub title: Option<String>,
    pub original_name: Option<String>,
    pub original_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchEntry>,
}

/// Detail payload with `append_to_response=alternative_titles`
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub name: Option<String>,
    pub title: Option<String>,
    pub original_name: Option<String>,
    pub original_title: Option<String>,
    #[serde(default)]
    pub alternative_titles: AlternativeTitles,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlternativeTitles {
    /// TV uses `results`, movies use `titles`
    #[serde(default)]
    pub results: Vec<AlternativeTitle>,
    #[serde(default)]
    pub titles: Vec<AlternativeTitle>,
}

#[derive(Debug, Deserialize)]
pub struct AlternativeTitle {
    pub title: String,
}

/// One group listed by `/tv/{id}/episode_groups`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeGroupSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group_count: i32,
    #[serde(default)]
    pub episode_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeGroupListResponse {
    #[serde(default)]
    pub results: Vec<EpisodeGroupSummary>,
}

/// Full group detail from `/tv/episode_group/{group_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeGroupDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupSeason>,
}

/// One custom season inside a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSeason {
    pub id: String,
    pub name: String,
    pub order: i32,
    #[serde(default)]
    pub episodes: Vec<GroupEpisode>,
}

/// One episode inside a custom season
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEpisode {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub episode_number: i32,
    pub season_number: i32,
    /// 0-based position across the whole group
    pub order: i32,
}
