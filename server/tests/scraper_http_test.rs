//! Rate-limited HTTP client behavior against a local mock server.

mod common;

use common::TestDb;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use danmud::infrastructure::scrapers::{RateLimitedClient, SessionHandler};
use danmud::shared::error::ScraperError;

async fn client(db: &TestDb, min_interval: Duration) -> RateLimitedClient {
    RateLimitedClient::new("mock", db.config_repo.clone(), min_interval, false)
        .await
        .expect("client")
}

#[tokio::test]
async fn requests_are_spaced_by_the_minimum_interval() {
    let db = TestDb::new().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let client = client(&db, Duration::from_millis(200)).await;
    let url = format!("{}/ping", server.uri());

    let started = Instant::now();
    for _ in 0..3 {
        let (status, body) = client.fetch_text(client.client().get(&url)).await.unwrap();
        assert!(status.is_success());
        assert_eq!(body, "pong");
    }

    // Three requests mean two enforced gaps
    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "throttle did not space the requests"
    );
}

/// Flags the first response as a dead session, succeeds after refresh
struct FlakySession {
    refreshed: AtomicBool,
}

#[async_trait::async_trait]
impl SessionHandler for FlakySession {
    fn is_session_expired(&self, _status: reqwest::StatusCode, body: &str) -> bool {
        !self.refreshed.load(Ordering::SeqCst) && body.contains("login required")
    }

    async fn refresh_session(&self) -> Result<(), ScraperError> {
        self.refreshed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn session_expiry_triggers_one_refresh_and_replay() {
    let db = TestDb::new().await;
    let server = MockServer::start().await;

    // First call gets the login prompt, the replay gets real data
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("login required"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
        .mount(&server)
        .await;

    let client = client(&db, Duration::from_millis(10)).await;
    let url = format!("{}/data", server.uri());
    let session = FlakySession {
        refreshed: AtomicBool::new(false),
    };

    let (_, body) = client
        .fetch_text_with_retry(|c| c.get(&url), &session)
        .await
        .unwrap();
    assert_eq!(body, "payload");
    assert!(session.refreshed.load(Ordering::SeqCst));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn upstream_errors_surface_as_status() {
    let db = TestDb::new().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client(&db, Duration::from_millis(10)).await;
    let url = format!("{}/broken", server.uri());
    let (status, _) = client.fetch_text(client.client().get(&url)).await.unwrap();
    assert_eq!(status.as_u16(), 502);
}
