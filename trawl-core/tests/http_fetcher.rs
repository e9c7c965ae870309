//! Integration tests for the reqwest-backed fetcher using wiremock.
//!
//! These tests mock origin responses to verify failure classification and
//! header behavior without touching real torrent indexes.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use trawl_core::config::{DEFAULT_USER_AGENT, NetworkConfig};
use trawl_core::{FetchError, Fetcher, HttpFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_with_timeout(timeout: Duration) -> HttpFetcher {
    let config = NetworkConfig {
        fetch_timeout: timeout,
        ..Default::default()
    };
    HttpFetcher::new(&config).unwrap()
}

#[tokio::test]
async fn test_success_returns_body_with_default_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/ubuntu/1/"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rows</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_with_timeout(Duration::from_secs(5));
    let body = fetcher
        .fetch(&format!("{}/search/ubuntu/1/", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(body, "<html>rows</html>");
}

#[tokio::test]
async fn test_caller_agent_is_not_overridden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "custom-agent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("custom-agent/1.0"));

    let fetcher = fetcher_with_timeout(Duration::from_secs(5));
    let body = fetcher.fetch(&server.uri(), Some(&headers)).await.unwrap();

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_non_success_status_is_origin_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher_with_timeout(Duration::from_secs(5));
    let err = fetcher.fetch(&server.uri(), None).await.unwrap_err();

    match err {
        FetchError::OriginRejection {
            status,
            status_text,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(status_text, "Not Found");
        }
        other => panic!("Expected origin rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_service_unavailable_reads_as_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher_with_timeout(Duration::from_secs(5));
    let err = fetcher.fetch(&server.uri(), None).await.unwrap_err();

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_timeout_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let fetcher = fetcher_with_timeout(Duration::from_millis(200));
    let err = fetcher.fetch(&server.uri(), None).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_host_is_transport_failure() {
    let fetcher = fetcher_with_timeout(Duration::from_secs(2));
    let err = fetcher.fetch("http://127.0.0.1:1/", None).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_cookies_persist_across_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "session=abc123; Path=/"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("authorized"))
        .mount(&server)
        .await;

    let fetcher = fetcher_with_timeout(Duration::from_secs(5));
    fetcher
        .fetch(&format!("{}/login", server.uri()), None)
        .await
        .unwrap();
    let body = fetcher
        .fetch(&format!("{}/search", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(body, "authorized");
}
