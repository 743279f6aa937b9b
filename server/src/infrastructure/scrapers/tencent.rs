//! tencent scraper
//!
//! Search through the mobile recall endpoint, paginated episode listings
//! through the page server, and segmented danmaku JSON with per-segment
//! progress reporting.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::domain::repositories::{CacheRepository, ConfigRepository};
use crate::domain::value_objects::WorkType;
use crate::infrastructure::scrapers::base::{
    ScraperBase, DEFAULT_EPISODES_TTL, DEFAULT_SEARCH_TTL,
};
use crate::infrastructure::scrapers::http::{RateLimitedClient, DEFAULT_MIN_INTERVAL};
use crate::infrastructure::scrapers::normalize::normalize_comments;
use crate::interfaces::progress::ProgressSink;
use crate::interfaces::scrapers::{
    comment_mode, DanmakuComment, EpisodeHint, EpisodeListing, Scraper, SearchCandidate,
    DEFAULT_COMMENT_COLOR,
};
use crate::shared::error::ScraperError;
use crate::shared::text::TitleNormalizer;

const PROVIDER: &str = "tencent";

const SEARCH_URL: &str =
    "https://pbaccess.video.qq.com/trpc.videosearch.mobile_search.HttpMobileRecall/MbSearchHttp";
const EPISODES_URL: &str = "https://pbaccess.video.qq.com/trpc.universal_backend_service.page_server_rpc.PageServer/GetPageData?video_appid=3000010&vplatform=2";
const BARRAGE_BASE_URL: &str = "https://dm.video.qq.com/barrage/base";
const BARRAGE_SEGMENT_URL: &str = "https://dm.video.qq.com/barrage/segment";

/// Non-main content embedded in episode titles
static JUNK_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"预告|彩蛋|专访|直拍|直播回顾|加更|走心|解忧|纯享|节点|解读|揭秘|赏析|速看|资讯|访谈|番外|短片|纪录片")
        .unwrap()
});

static VID_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([a-zA-Z0-9]+)\.html").unwrap());

// --- Upstream DTOs ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    version: &'a str,
    filter_value: &'a str,
    retry: i32,
    pagenum: i32,
    pagesize: i32,
    query_from: i32,
    #[serde(rename = "isneedQc")]
    is_need_qc: bool,
    scene_id: i32,
    platform: &'a str,
}

impl<'a> SearchRequest<'a> {
    fn new(query: &'a str) -> Self {
        Self {
            query,
            version: "",
            filter_value: "firstTabid=150",
            retry: 0,
            pagenum: 0,
            pagesize: 20,
            query_from: 4,
            is_need_qc: true,
            scene_id: 21,
            platform: "23",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    normal_list: Option<SearchItemList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemList {
    item_list: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    video_info: Option<SearchVideoInfo>,
    doc: SearchDoc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchVideoInfo {
    title: String,
    year: Option<i32>,
    type_name: String,
    img_url: Option<String>,
    subject_doc: Option<SubjectDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubjectDoc {
    #[serde(default)]
    video_num: i32,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TencentEpisode {
    vid: String,
    title: String,
    #[serde(default)]
    is_trailer: String,
}

#[derive(Debug, Deserialize)]
struct BarrageBase {
    #[serde(default)]
    segment_index: HashMap<String, BarrageSegmentRef>,
}

#[derive(Debug, Deserialize)]
struct BarrageSegmentRef {
    segment_name: String,
}

#[derive(Debug, Deserialize)]
struct BarrageSegment {
    #[serde(default)]
    barrage_list: Vec<TencentComment>,
}

#[derive(Debug, Deserialize)]
struct TencentComment {
    id: String,
    /// Milliseconds, as a decimal string
    time_offset: String,
    content: String,
    /// Empty string for plain comments, an object for styled ones
    #[serde(default)]
    content_style: StyleField,
}

/// The style field is either a bare string (usually empty) or an object;
/// modeled as an untagged variant instead of collapsing to "any"
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum StyleField {
    #[default]
    None,
    Text(String),
    Style(TencentCommentStyle),
}

#[derive(Debug, Deserialize)]
struct TencentCommentStyle {
    color: Option<String>,
    position: Option<i32>,
}

/// tencent scraper
pub struct TencentScraper {
    base: ScraperBase,
    http: RateLimitedClient,
}

impl TencentScraper {
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

    fn request_headers(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        // This cookie set is what the platform expects from a web client
        builder
            .header(reqwest::header::REFERER, "https://v.qq.com/")
            .header(
                reqwest::header::COOKIE,
                "pgv_pvid=40b67e3b06027f3d; video_platform=2; vversion_name=8.2.95",
            )
    }

    async fn fetch_episode_page(
        &self,
        cid: &str,
        page_context: &str,
    ) -> Result<(Vec<TencentEpisode>, String), ScraperError> {
        let payload = serde_json::json!({
            "pageParams": {
                "cid": cid,
                "page_type": "detail_operation",
                "page_id": "vsite_episode_list",
                "id_type": "1",
                "page_size": "100",
                "lid": "0",
                "req_from": "web_mobile",
                "page_context": page_context,
            },
        });

        let request =
            Self::request_headers(self.http.client().post(EPISODES_URL).json(&payload));
        let (status, body) = self.http.fetch_text(request).await?;
        if !status.is_success() {
            return Err(ScraperError::UpstreamStatus(status.as_u16()));
        }

        // The page server nests episode items deep inside module lists;
        // walk the tree instead of modeling every layer
        let root: serde_json::Value = serde_json::from_str(&body)?;
        let mut episodes = Vec::new();
        let mut next_context = String::new();
        collect_episode_items(&root, &mut episodes);
        if let Some(context) = find_next_page_context(&root) {
            next_context = context;
        }
        Ok((episodes, next_context))
    }

    async fn all_episodes(&self, cid: &str) -> Result<Vec<TencentEpisode>, ScraperError> {
        let mut all: Vec<TencentEpisode> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut page_context = String::new();

        // The page server caps out well below this; the bound only guards
        // against a pathological pagination loop
        for _ in 0..30 {
            let (episodes, next_context) =
                self.fetch_episode_page(cid, &page_context).await?;
            let mut got_new = false;
            for episode in episodes {
                if seen.insert(episode.vid.clone()) {
                    all.push(episode);
                    got_new = true;
                }
            }
            if next_context.is_empty() || !got_new {
                break;
            }
            page_context = next_context;
        }
        Ok(all)
    }

    async fn fetch_comment_segments(
        &self,
        vid: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<TencentComment>, ScraperError> {
        let base_url = format!("{BARRAGE_BASE_URL}/{vid}");
        let request = Self::request_headers(self.http.client().get(&base_url));
        let (status, body) = self.http.fetch_text(request).await?;
        if !status.is_success() {
            return Err(ScraperError::UpstreamStatus(status.as_u16()));
        }
        let base: BarrageBase = serde_json::from_str(&body)?;

        // Segment keys are millisecond offsets; fetch in timeline order
        let mut keys: Vec<&String> = base.segment_index.keys().collect();
        keys.sort_by_key(|k| k.parse::<i64>().unwrap_or(i64::MAX));
        let segments: Vec<&BarrageSegmentRef> =
            keys.iter().map(|k| &base.segment_index[k.as_str()]).collect();

        let total = segments.len().max(1);
        let mut all = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            let percent = ((i as f64 / total as f64) * 100.0).round() as i32;
            progress
                .report(
                    percent,
                    &format!("downloading danmaku segment {}/{}", i + 1, total),
                )
                .await
                .map_err(|_| ScraperError::Aborted)?;

            let url = format!("{BARRAGE_SEGMENT_URL}/{vid}/{}", segment.segment_name);
            let request = Self::request_headers(self.http.client().get(&url));
            match self.http.fetch_text(request).await {
                Ok((status, body)) if status.is_success() => {
                    match serde_json::from_str::<BarrageSegment>(&body) {
                        Ok(parsed) => all.extend(parsed.barrage_list),
                        Err(e) => {
                            // Ad and recommendation entries occasionally sneak
                            // into the list with a different shape
                            debug!(provider = PROVIDER, vid, "skipping malformed segment: {e}");
                        }
                    }
                }
                Ok((status, _)) => {
                    error!(provider = PROVIDER, vid, %status, "danmaku segment request failed");
                }
                Err(e) => {
                    error!(provider = PROVIDER, vid, "danmaku segment request failed: {e}");
                }
            }
        }

        progress
            .report(100, "danmaku assembled")
            .await
            .map_err(|_| ScraperError::Aborted)?;
        Ok(all)
    }

    fn format_comments(&self, raw: Vec<TencentComment>) -> Vec<DanmakuComment> {
        let mut comments = Vec::with_capacity(raw.len());
        for c in raw {
            let mut mode = comment_mode::SCROLL;
            let mut color = DEFAULT_COMMENT_COLOR;
            if let StyleField::Style(style) = &c.content_style {
                match style.position {
                    Some(2) => mode = comment_mode::TOP,
                    Some(3) => mode = comment_mode::BOTTOM,
                    _ => {}
                }
                // Colors arrive as decimal strings
                if let Some(parsed) = style.color.as_deref().and_then(|v| v.parse().ok()) {
                    color = parsed;
                }
            }
            let seconds = c.time_offset.parse::<f64>().unwrap_or(0.0) / 1000.0;
            comments.push(DanmakuComment::new(
                c.id, seconds, mode, color, PROVIDER, c.content,
            ));
        }
        normalize_comments(comments)
    }
}

/// Recursively collects `{vid, title, is_trailer}` objects from the page
/// server's nested module tree
fn collect_episode_items(value: &serde_json::Value, out: &mut Vec<TencentEpisode>) {
    match value {
        serde_json::Value::Object(map) => {
            if map.contains_key("vid") && map.contains_key("title") {
                if let Ok(episode) =
                    serde_json::from_value::<TencentEpisode>(value.clone())
                {
                    out.push(episode);
                    return;
                }
            }
            for child in map.values() {
                collect_episode_items(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for child in items {
                collect_episode_items(child, out);
            }
        }
        _ => {}
    }
}

/// Finds the pagination context for the next episode page, if any
fn find_next_page_context(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(context)) = map.get("page_context") {
                if !context.is_empty() {
                    return Some(context.clone());
                }
            }
            map.values().find_map(find_next_page_context)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_next_page_context),
        _ => None,
    }
}

#[async_trait]
impl Scraper for TencentScraper {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn configurable_fields(&self) -> Vec<(String, String)> {
        vec![("tencent_cookie".to_string(), "Cookie".to_string())]
    }

    async fn search(&self, keyword: &str, hint: Option<&EpisodeHint>) -> Vec<SearchCandidate> {
        let hint_pair = hint.and_then(|h| Some((h.season?, h.episode?)));
        let cache_key = self.base.search_cache_key(keyword, hint_pair);
        if let Some(cached) = self.base.cache_get::<Vec<SearchCandidate>>(&cache_key).await {
            return cached;
        }

        let request = Self::request_headers(
            self.http
                .client()
                .post(SEARCH_URL)
                .json(&SearchRequest::new(keyword)),
        );

        let mut results = Vec::new();
        match self.http.fetch_text(request).await {
            Ok((status, body)) if status.is_success() => {
                match serde_json::from_str::<SearchResult>(&body) {
                    Ok(parsed) => {
                        let items = parsed
                            .data
                            .and_then(|d| d.normal_list)
                            .map(|l| l.item_list)
                            .unwrap_or_default();
                        for item in items {
                            let Some(info) = item.video_info else { continue };
                            // Entries without a year are almost always news
                            // clips and shorts
                            if info.year.unwrap_or(0) == 0 {
                                continue;
                            }
                            let title = TitleNormalizer::clean_scraped(&info.title);
                            if self.base.is_blacklisted(&title).await {
                                continue;
                            }
                            let work_type = if info.type_name.contains("电影") {
                                WorkType::Movie
                            } else {
                                WorkType::TvSeries
                            };
                            results.push(SearchCandidate {
                                provider: PROVIDER.to_string(),
                                media_id: item.doc.id,
                                season: keyword_parser::season_from_title(&title) as i32,
                                title,
                                work_type,
                                year: info.year,
                                image_url: info.img_url,
                                episode_count: info.subject_doc.map(|d| d.video_num),
                                current_episode_index: None,
                            });
                        }
                    }
                    Err(e) => error!(provider = PROVIDER, "search parse failed: {e}"),
                }
            }
            Ok((status, _)) => {
                error!(provider = PROVIDER, %status, "search request failed");
            }
            Err(e) => error!(provider = PROVIDER, "search request failed: {e}"),
        }

        info!(provider = PROVIDER, keyword, count = results.len(), "search finished");
        self.base
            .cache_set(&cache_key, &results, "search_ttl_seconds", DEFAULT_SEARCH_TTL)
            .await;
        results
    }

    async fn get_episodes(
        &self,
        media_id: &str,
        target_episode_index: Option<i32>,
        db_media_type: Option<WorkType>,
    ) -> Result<Vec<EpisodeListing>, ScraperError> {
        let cache_key = self.base.episodes_cache_key(media_id);
        let cached = if target_episode_index.is_none() {
            self.base.cache_get::<Vec<TencentEpisode>>(&cache_key).await
        } else {
            None
        };

        let raw = match cached {
            Some(raw) => raw,
            None => {
                let fetched = self.all_episodes(media_id).await?;
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

        let mut episodes = Vec::new();
        let mut index = 0;
        for episode in raw {
            if episode.is_trailer == "1" {
                continue;
            }
            let title = TitleNormalizer::clean_scraped(&episode.title);
            if self.base.is_blacklisted(&title).await {
                continue;
            }
            index += 1;
            episodes.push(EpisodeListing {
                provider: PROVIDER.to_string(),
                episode_id: episode.vid.clone(),
                title,
                episode_index: index,
                url: Some(format!("https://v.qq.com/x/cover/{media_id}/{}.html", episode.vid)),
            });
        }

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
        let raw = self
            .fetch_comment_segments(provider_episode_id, progress)
            .await?;
        let normalized = self.format_comments(raw);
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
                // The vid is the last path segment before .html
                Ok(VID_URL_RE
                    .captures(url)
                    .map(|caps| serde_json::json!({ "mediaId": caps[1].to_string() }))
                    .unwrap_or(serde_json::Value::Null))
            }
            other => Err(ScraperError::ActionNotImplemented(other.to_string())),
        }
    }
}
