//! End-to-end tests: a real listener in front of a mocked upstream

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use occ_gateway::cache::{Clock, ReadThroughGate, TtlCache};
use occ_gateway::feeds::{Feed, FeedKind, UpstreamFeed};
use occ_gateway::server::build_router;
use occ_gateway::upstream::{UpstreamFetcher, DEFAULT_TIMEOUT};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts the gateway on an ephemeral port and returns its base URL
async fn spawn_gateway(gate: ReadThroughGate, feeds: Vec<Arc<dyn Feed>>) -> String {
    let router = build_router(gate, feeds, &[]);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fetcher() -> UpstreamFetcher {
    UpstreamFetcher::new(DEFAULT_TIMEOUT).expect("client should build")
}

fn tvt_feed(server: &MockServer) -> Arc<dyn Feed> {
    Arc::new(
        UpstreamFeed::new(FeedKind::WazeTvt, fetcher())
            .with_url(format!("{}/tvt", server.uri()))
            .with_ttl(Duration::from_millis(15_000)),
    )
}

#[tokio::test]
async fn test_repeated_requests_within_ttl_hit_upstream_once() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"routes":[]}"#, "application/json"))
        .expect(1)
        .mount(&upstream)
        .await;
    let base = spawn_gateway(ReadThroughGate::default(), vec![tvt_feed(&upstream)]).await;
    let client = reqwest::Client::new();

    for expected in ["MISS", "HIT", "HIT"] {
        let response = client
            .get(format!("{}/api/waze/tvt", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["x-cache-status"], expected);
        assert_eq!(response.text().await.unwrap(), r#"{"routes":[]}"#);
    }
}

#[tokio::test]
async fn test_upstream_error_is_relayed_and_not_cached() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string(r#"{"error":"maintenance"}"#))
        .expect(2)
        .mount(&upstream)
        .await;
    let base = spawn_gateway(ReadThroughGate::default(), vec![tvt_feed(&upstream)]).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client
            .get(format!("{}/api/waze/tvt", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
        assert_eq!(response.text().await.unwrap(), r#"{"error":"maintenance"}"#);
    }
}

#[tokio::test]
async fn test_stale_entry_served_when_enabled_and_upstream_fails() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<ok/>", "application/xml"))
        .up_to_n_times(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;

    let now: Arc<Mutex<DateTime<Utc>>> = Arc::new(Mutex::new(Utc::now()));
    let handle = now.clone();
    let clock: Clock = Arc::new(move || *handle.lock().unwrap());
    let gate = ReadThroughGate::new(Arc::new(TtlCache::with_clock(clock))).with_stale_on_error(true);

    let base = spawn_gateway(gate, vec![tvt_feed(&upstream)]).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/waze/tvt", base);

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.headers()["x-cache-status"], "MISS");

    *now.lock().unwrap() += TimeDelta::milliseconds(20_000);

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(second.headers()["x-cache-status"], "STALE");
    assert_eq!(second.text().await.unwrap(), "<ok/>");
}

#[tokio::test]
async fn test_health_bypasses_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let base = spawn_gateway(ReadThroughGate::default(), vec![tvt_feed(&upstream)]).await;

    let response = reqwest::get(format!("{}/health", base)).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"ok":true}"#);
}
