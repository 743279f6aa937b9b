//! bilibili scraper
//!
//! Search via the public type-search API, PGC episode listings via the
//! season API, UGC multi-part videos via the view API, and comments via the
//! XML danmaku endpoint.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::repositories::{CacheRepository, ConfigRepository};
use crate::infrastructure::scrapers::base::{
    ScraperBase, DEFAULT_EPISODES_TTL, DEFAULT_SEARCH_TTL,
};
use crate::infrastructure::scrapers::http::{
    NoSession, RateLimitedClient, DEFAULT_MIN_INTERVAL,
};
use crate::infrastructure::scrapers::normalize::normalize_comments;
use crate::interfaces::progress::ProgressSink;
use crate::interfaces::scrapers::{
    comment_mode, DanmakuComment, EpisodeHint, EpisodeListing, Scraper, SearchCandidate,
    DEFAULT_COMMENT_COLOR,
};
use crate::domain::value_objects::WorkType;
use crate::shared::error::ScraperError;
use crate::shared::text::TitleNormalizer;

const PROVIDER: &str = "bilibili";

/// Non-main content: standalone English markers (word-bounded or
/// bracketed) plus embedded Chinese markers
static JUNK_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([\[【]|\b)(NC|OP|ED|SP|OVA|OAD|CM|PV|MV|Menu|Bonus|Recap|Teaser|Trailer|Preview)(\d{1,2})?([\]】]|\b)|(特典|预告|广告|菜单|花絮|特辑|速看|资讯|彩蛋|直拍|直播回顾|片头|片尾|幕后|映像|番外篇)",
    )
    .unwrap()
});

static SEASON_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(ss|md)(\d+)").unwrap());
static BVID_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(BV[0-9A-Za-z]{10})").unwrap());

// --- Upstream DTOs ---

#[derive(Debug, Deserialize)]
struct BiliApiResult {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<BiliSearchData>,
}

#[derive(Debug, Deserialize)]
struct BiliSearchData {
    #[serde(default)]
    result: Vec<BiliSearchItem>,
}

#[derive(Debug, Deserialize)]
struct BiliSearchItem {
    title: String,
    season_id: Option<i64>,
    bvid: Option<String>,
    #[serde(default)]
    season_type_name: String,
    pubtime: Option<i64>,
    cover: Option<String>,
    ep_size: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BiliSeasonResult {
    code: i64,
    result: Option<BiliSeason>,
}

#[derive(Debug, Deserialize)]
struct BiliSeason {
    #[serde(default)]
    episodes: Vec<BiliSeasonEpisode>,
}

#[derive(Debug, Deserialize)]
struct BiliSeasonEpisode {
    id: i64,
    aid: i64,
    cid: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    long_title: String,
    #[serde(default)]
    show_title: String,
}

#[derive(Debug, Deserialize)]
struct BiliViewResult {
    code: i64,
    data: Option<BiliView>,
}

#[derive(Debug, Deserialize)]
struct BiliView {
    aid: i64,
    #[serde(default)]
    pages: Vec<BiliViewPage>,
}

#[derive(Debug, Deserialize)]
struct BiliViewPage {
    cid: i64,
    page: i32,
    #[serde(default)]
    part: String,
}

/// The XML danmaku document: `<i><d p="...">text</d>...</i>`
#[derive(Debug, Deserialize)]
struct XmlDanmakuFile {
    #[serde(rename = "d", default)]
    items: Vec<XmlDanmakuItem>,
}

#[derive(Debug, Deserialize)]
struct XmlDanmakuItem {
    /// `time,mode,fontsize,color,timestamp,pool,userhash,rowid`
    #[serde(rename = "@p")]
    p: String,
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

/// bilibili scraper
pub struct BilibiliScraper {
    base: ScraperBase,
    http: RateLimitedClient,
}

impl BilibiliScraper {
    pub async fn new(
        cache: Arc<dyn CacheRepository>,
        config: Arc<dyn ConfigRepository>,
        use_proxy: bool,
    ) -> Result<Self, ScraperError> {
        let http =
            RateLimitedClient::new(PROVIDER, config.clone(), DEFAULT_MIN_INTERVAL, use_proxy)
                .await?;
        Ok(Self {
            base: ScraperBase::new(PROVIDER, cache, config, Some(JUNK_TITLE.clone())),
            http,
        })
    }

    async fn search_by_type(
        &self,
        keyword: &str,
        search_type: &str,
    ) -> Result<Vec<SearchCandidate>, ScraperError> {
        let url = format!(
            "https://api.bilibili.com/x/web-interface/search/type?search_type={}&keyword={}",
            search_type,
            urlencoding::encode(keyword)
        );
        let cookie = self.http.cookie().await?;
        let mut request = self.http.client().get(&url);
        if !cookie.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let (status, body) = self.http.fetch_text(request).await?;
        if !status.is_success() {
            return Err(ScraperError::UpstreamStatus(status.as_u16()));
        }
        let api: BiliApiResult = serde_json::from_str(&body)?;
        if api.code != 0 {
            info!(provider = PROVIDER, code = api.code, message = %api.message, "search returned no results");
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for item in api.data.map(|d| d.result).unwrap_or_default() {
            let cleaned = TitleNormalizer::clean_scraped(&item.title);
            if self.base.is_blacklisted(&cleaned).await {
                continue;
            }

            let media_id = match (item.season_id, &item.bvid) {
                (Some(season_id), _) => format!("ss{season_id}"),
                (None, Some(bvid)) => format!("bv{bvid}"),
                _ => continue,
            };
            let work_type = if item.season_type_name == "电影" {
                WorkType::Movie
            } else {
                WorkType::TvSeries
            };
            let year = item
                .pubtime
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|dt| {
                    use chrono::Datelike;
                    dt.year()
                });

            results.push(SearchCandidate {
                provider: PROVIDER.to_string(),
                media_id,
                season: keyword_parser::season_from_title(&cleaned) as i32,
                title: cleaned,
                work_type,
                year,
                image_url: item.cover,
                episode_count: item.ep_size,
                current_episode_index: None,
            });
        }
        Ok(results)
    }

    async fn pgc_episodes(&self, season_id: &str) -> Result<Vec<EpisodeListing>, ScraperError> {
        let url =
            format!("https://api.bilibili.com/pgc/view/web/ep/list?season_id={season_id}");
        let (status, body) = self.http.fetch_text(self.http.client().get(&url)).await?;
        if !status.is_success() {
            return Err(ScraperError::UpstreamStatus(status.as_u16()));
        }
        let data: BiliSeasonResult = serde_json::from_str(&body)?;
        if data.code != 0 {
            return Ok(Vec::new());
        }

        let mut filtered = Vec::new();
        for ep in data.result.map(|r| r.episodes).unwrap_or_default() {
            let title_to_check = if !ep.show_title.is_empty() {
                ep.show_title.clone()
            } else {
                ep.long_title.clone()
            };
            if self.base.is_blacklisted(&title_to_check).await {
                continue;
            }
            filtered.push(ep);
        }

        Ok(filtered
            .into_iter()
            .enumerate()
            .map(|(i, ep)| EpisodeListing {
                provider: PROVIDER.to_string(),
                episode_id: format!("{},{}", ep.aid, ep.cid),
                title: if ep.long_title.is_empty() {
                    ep.title.clone()
                } else {
                    ep.long_title.clone()
                },
                episode_index: i as i32 + 1,
                url: Some(format!("https://www.bilibili.com/bangumi/play/ep{}", ep.id)),
            })
            .collect())
    }

    async fn ugc_episodes(&self, bvid: &str) -> Result<Vec<EpisodeListing>, ScraperError> {
        let url = format!("https://api.bilibili.com/x/web-interface/view?bvid={bvid}");
        let (status, body) = self.http.fetch_text(self.http.client().get(&url)).await?;
        if !status.is_success() {
            return Err(ScraperError::UpstreamStatus(status.as_u16()));
        }
        let data: BiliViewResult = serde_json::from_str(&body)?;
        if data.code != 0 {
            return Ok(Vec::new());
        }
        let Some(view) = data.data else {
            return Ok(Vec::new());
        };

        Ok(view
            .pages
            .iter()
            .map(|p| EpisodeListing {
                provider: PROVIDER.to_string(),
                episode_id: format!("{},{}", view.aid, p.cid),
                title: p.part.clone(),
                episode_index: p.page,
                url: Some(format!("https://www.bilibili.com/video/{bvid}?p={}", p.page)),
            })
            .collect())
    }

    fn parse_xml_comments(&self, body: &str) -> Result<Vec<DanmakuComment>, ScraperError> {
        let file: XmlDanmakuFile = quick_xml::de::from_str(body)
            .map_err(|e| ScraperError::Parse(format!("danmaku xml: {e}")))?;

        let mut comments = Vec::with_capacity(file.items.len());
        for (i, item) in file.items.iter().enumerate() {
            let Some(text) = item.text.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let fields: Vec<&str> = item.p.split(',').collect();
            if fields.len() < 4 {
                continue;
            }
            let seconds: f64 = fields[0].parse().unwrap_or(0.0);
            let mode = match fields[1].parse::<i32>().unwrap_or(1) {
                4 => comment_mode::BOTTOM,
                5 => comment_mode::TOP,
                _ => comment_mode::SCROLL,
            };
            let color: i32 = fields[3].parse().unwrap_or(DEFAULT_COMMENT_COLOR);
            // rowid is the stable upstream id; fall back to the position
            let cid = fields
                .get(7)
                .filter(|id| !id.is_empty())
                .map(|id| id.to_string())
                .unwrap_or_else(|| i.to_string());

            comments.push(DanmakuComment::new(cid, seconds, mode, color, PROVIDER, text));
        }
        Ok(comments)
    }
}

#[async_trait]
impl Scraper for BilibiliScraper {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn configurable_fields(&self) -> Vec<(String, String)> {
        vec![(
            "bilibili_cookie".to_string(),
            "Cookie (SESSDATA=...)".to_string(),
        )]
    }

    async fn search(&self, keyword: &str, hint: Option<&EpisodeHint>) -> Vec<SearchCandidate> {
        let hint_pair = hint.and_then(|h| Some((h.season?, h.episode?)));
        let cache_key = self.base.search_cache_key(keyword, hint_pair);
        if let Some(cached) = self.base.cache_get::<Vec<SearchCandidate>>(&cache_key).await {
            return cached;
        }

        let mut all = Vec::new();
        for search_type in ["media_bangumi", "media_ft"] {
            match self.search_by_type(keyword, search_type).await {
                Ok(results) => all.extend(results),
                Err(e) => {
                    error!(provider = PROVIDER, search_type, "search failed: {e}");
                }
            }
        }
        // One entry per media id across the two passes
        let mut seen = std::collections::HashSet::new();
        all.retain(|c| seen.insert(c.media_id.clone()));

        self.base
            .cache_set(&cache_key, &all, "search_ttl_seconds", DEFAULT_SEARCH_TTL)
            .await;
        all
    }

    async fn get_episodes(
        &self,
        media_id: &str,
        target_episode_index: Option<i32>,
        db_media_type: Option<WorkType>,
    ) -> Result<Vec<EpisodeListing>, ScraperError> {
        let cache_key = self.base.episodes_cache_key(media_id);
        let cached = if target_episode_index.is_none() {
            self.base.cache_get::<Vec<EpisodeListing>>(&cache_key).await
        } else {
            None
        };

        let mut episodes = match cached {
            Some(episodes) => episodes,
            None => {
                let fetched = if let Some(season_id) = media_id.strip_prefix("ss") {
                    self.pgc_episodes(season_id).await?
                } else if let Some(bvid) = media_id.strip_prefix("bv") {
                    self.ugc_episodes(bvid).await?
                } else {
                    warn!(provider = PROVIDER, media_id, "unrecognized media id shape");
                    Vec::new()
                };
                if target_episode_index.is_none() {
                    self.base
                        .cache_set(
                            &cache_key,
                            &fetched,
                            "episodes_ttl_seconds",
                            DEFAULT_EPISODES_TTL,
                        )
                        .await;
                }
                fetched
            }
        };

        if db_media_type.map(|t| t.is_movie()).unwrap_or(false) && episodes.len() > 1 {
            episodes.truncate(1);
            episodes[0].episode_index = 1;
        }
        if let Some(target) = target_episode_index {
            episodes.retain(|ep| ep.episode_index == target);
        }
        Ok(episodes)
    }

    async fn get_comments(
        &self,
        provider_episode_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<DanmakuComment>, ScraperError> {
        let cid = provider_episode_id
            .split(',')
            .nth(1)
            .or(Some(provider_episode_id))
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ScraperError::Parse(format!("invalid episode id '{provider_episode_id}'"))
            })?;

        progress
            .report(10, "downloading danmaku")
            .await
            .map_err(|_| ScraperError::Aborted)?;

        let url = format!("https://comment.bilibili.com/{cid}.xml");
        let (status, body) = self
            .http
            .fetch_text_with_retry(|client| client.get(&url), &NoSession)
            .await?;
        if !status.is_success() {
            return Err(ScraperError::UpstreamStatus(status.as_u16()));
        }

        progress
            .report(70, "parsing danmaku")
            .await
            .map_err(|_| ScraperError::Aborted)?;

        let comments = self.parse_xml_comments(&body)?;
        let normalized = normalize_comments(comments);

        progress
            .report(100, "danmaku assembled")
            .await
            .map_err(|_| ScraperError::Aborted)?;
        info!(
            provider = PROVIDER,
            episode = provider_episode_id,
            count = normalized.len(),
            "comments fetched"
        );
        Ok(normalized)
    }

    async fn execute_action(
        &self,
        name: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, ScraperError> {
        match name {
            "url_to_media_id" => {
                let url = payload
                    .get("url")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| ScraperError::Parse("missing 'url' field".to_string()))?;
                if let Some(caps) = SEASON_URL_RE.captures(url) {
                    return Ok(serde_json::json!({ "mediaId": format!("ss{}", &caps[2]) }));
                }
                if let Some(caps) = BVID_URL_RE.captures(url) {
                    return Ok(serde_json::json!({ "mediaId": format!("bv{}", &caps[1]) }));
                }
                Ok(serde_json::Value::Null)
            }
            other => Err(ScraperError::ActionNotImplemented(other.to_string())),
        }
    }
}
