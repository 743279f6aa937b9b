//! Rate-limited HTTP client
//!
//! One instance per scraper. A fair mutex serializes outgoing requests and
//! enforces the per-provider minimum interval; the mutex is released before
//! the body is read so deserialization never blocks the next request's
//! throttle window.

use reqwest::{RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::repositories::ConfigRepository;
use crate::shared::error::ScraperError;

/// Default per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default minimum interval between requests to one provider
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(450);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Session-expiry detection and recovery, implemented by scrapers that hold
/// login state. One refresh-and-replay is attempted per request.
#[async_trait::async_trait]
pub trait SessionHandler: Send + Sync {
    /// Heuristic: does this response mean our session is gone?
    fn is_session_expired(&self, _status: StatusCode, _body: &str) -> bool {
        false
    }

    /// Re-establish the session (refresh cookie, re-login)
    async fn refresh_session(&self) -> Result<(), ScraperError> {
        Ok(())
    }
}

/// A session handler for scrapers without login state
pub struct NoSession;

#[async_trait::async_trait]
impl SessionHandler for NoSession {}

/// Per-scraper HTTP client with interval throttling
pub struct RateLimitedClient {
    provider_name: &'static str,
    client: reqwest::Client,
    min_interval: Duration,
    last_request_at: Mutex<Option<Instant>>,
    config: Arc<dyn ConfigRepository>,
}

impl RateLimitedClient {
    /// Builds the client. The proxy is applied only when both the global
    /// `proxy_enabled` flag and the per-source `use_proxy` flag are set.
    pub async fn new(
        provider_name: &'static str,
        config: Arc<dyn ConfigRepository>,
        min_interval: Duration,
        use_proxy: bool,
    ) -> Result<Self, ScraperError> {
        let user_agent = config
            .get(&format!("{provider_name}_user_agent"), DEFAULT_USER_AGENT)
            .await?;

        let mut builder = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .cookie_store(true)
            .user_agent(user_agent);

        if use_proxy {
            let proxy_enabled = config.get("proxy_enabled", "false").await?;
            let proxy_url = config.get("proxy_url", "").await?;
            if proxy_enabled == "true" && !proxy_url.is_empty() {
                let proxy = reqwest::Proxy::all(&proxy_url)
                    .map_err(|e| ScraperError::Network(format!("invalid proxy: {e}")))?;
                builder = builder.proxy(proxy);
            }
        }

        Ok(Self {
            provider_name,
            client: builder
                .build()
                .map_err(|e| ScraperError::Network(e.to_string()))?,
            min_interval,
            last_request_at: Mutex::new(None),
            config,
        })
    }

    /// The underlying reqwest client, for building requests
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The persisted cookie blob for this provider, if any
    pub async fn cookie(&self) -> Result<String, ScraperError> {
        Ok(self
            .config
            .get(&format!("{}_cookie", self.provider_name), "")
            .await?)
    }

    /// Sends a request under the throttle mutex. The lock covers the sleep
    /// and the send; body reading happens after it is released.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, ScraperError> {
        let mut last = self.last_request_at.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        let result = builder.send().await;
        *last = Some(Instant::now());
        drop(last);

        Ok(result?)
    }

    /// Sends a request and reads the body as text, logging the raw response
    /// when `scraper_<provider>_log_responses` is set
    pub async fn fetch_text(
        &self,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, String), ScraperError> {
        let response = self.execute(builder).await?;
        let status = response.status();
        let body = response.text().await?;

        if self.should_log_responses().await {
            let snippet: String = body.chars().take(2048).collect();
            debug!(
                target: "scraper_responses",
                provider = self.provider_name,
                %status,
                body = %snippet,
                "raw response"
            );
        }

        Ok((status, body))
    }

    /// `fetch_text`, with one refresh-and-replay when the session handler
    /// flags the response as a dead session
    pub async fn fetch_text_with_retry<F>(
        &self,
        make_request: F,
        session: &dyn SessionHandler,
    ) -> Result<(StatusCode, String), ScraperError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder + Send + Sync,
    {
        let (status, body) = self.fetch_text(make_request(&self.client)).await?;
        if !session.is_session_expired(status, &body) {
            return Ok((status, body));
        }

        debug!(provider = self.provider_name, "session expired, refreshing and replaying once");
        session.refresh_session().await?;
        self.fetch_text(make_request(&self.client)).await
    }

    async fn should_log_responses(&self) -> bool {
        let key = format!("scraper_{}_log_responses", self.provider_name);
        matches!(self.config.get(&key, "false").await.as_deref(), Ok("true"))
    }
}
