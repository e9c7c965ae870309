//! Scripted fetcher for exercising providers without a network.
//!
//! Routes are matched by URL prefix, longest prefix first. A route holding
//! several replies hands them out in order and then keeps repeating the last
//! one. Unmatched URLs are answered with a 404 rejection.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;

use crate::FetchResult;
use crate::fetch::{FetchError, Fetcher};

/// One scripted response.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// 2xx response with this body
    Body(String),
    /// Non-2xx response with this status
    Status(u16),
    /// Transport failure with this reason
    Transport(String),
}

#[derive(Debug)]
struct Route {
    prefix: String,
    replies: VecDeque<ScriptedReply>,
}

/// In-memory `Fetcher` that records every call it receives.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl ScriptedFetcher {
    /// Creates a fetcher with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every reply by `latency`, as a slow origin would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answers URLs starting with `prefix` with `body`.
    pub fn respond(self, prefix: &str, body: impl Into<String>) -> Self {
        self.script(prefix, vec![ScriptedReply::Body(body.into())])
    }

    /// Answers URLs starting with `prefix` with a non-2xx `status`.
    pub fn reject(self, prefix: &str, status: u16) -> Self {
        self.script(prefix, vec![ScriptedReply::Status(status)])
    }

    /// Fails URLs starting with `prefix` with a transport error.
    pub fn fail(self, prefix: &str) -> Self {
        self.script(
            prefix,
            vec![ScriptedReply::Transport("connection refused".to_string())],
        )
    }

    /// Answers URLs starting with `prefix` with `replies` in order.
    pub fn script(self, prefix: &str, replies: Vec<ScriptedReply>) -> Self {
        self.routes.lock().push(Route {
            prefix: prefix.to_string(),
            replies: replies.into(),
        });
        self
    }

    /// All URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Total number of fetches.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of fetches whose URL starts with `prefix`.
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    fn next_reply(&self, url: &str) -> Option<ScriptedReply> {
        let mut routes = self.routes.lock();
        let route = routes
            .iter_mut()
            .filter(|route| url.starts_with(&route.prefix))
            .max_by_key(|route| route.prefix.len())?;

        if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _headers: Option<&HeaderMap>) -> FetchResult<String> {
        self.calls.lock().push(url.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_reply(url) {
            Some(ScriptedReply::Body(body)) => Ok(body),
            Some(ScriptedReply::Status(status)) => Err(FetchError::OriginRejection {
                url: url.to_string(),
                status,
                status_text: reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown")
                    .to_string(),
            }),
            Some(ScriptedReply::Transport(reason)) => Err(FetchError::Transport {
                url: url.to_string(),
                reason,
            }),
            None => Err(FetchError::OriginRejection {
                url: url.to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let fetcher = ScriptedFetcher::new()
            .respond("https://a.test/", "generic")
            .respond("https://a.test/search", "specific");

        assert_eq!(
            fetcher.fetch("https://a.test/search?q=x", None).await.unwrap(),
            "specific"
        );
        assert_eq!(fetcher.fetch("https://a.test/other", None).await.unwrap(), "generic");
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_sequence_repeats_last_reply() {
        let fetcher = ScriptedFetcher::new().script(
            "https://b.test",
            vec![ScriptedReply::Status(503), ScriptedReply::Body("ok".to_string())],
        );

        let first = fetcher.fetch("https://b.test/1", None).await;
        assert!(first.unwrap_err().is_rate_limited());
        assert_eq!(fetcher.fetch("https://b.test/1", None).await.unwrap(), "ok");
        assert_eq!(fetcher.fetch("https://b.test/1", None).await.unwrap(), "ok");
        assert_eq!(fetcher.calls_matching("https://b.test"), 3);
    }

    #[tokio::test]
    async fn test_latency_delays_reply() {
        let fetcher = ScriptedFetcher::new()
            .respond("https://c.test", "slow")
            .with_latency(Duration::from_millis(50));

        let started = std::time::Instant::now();
        assert_eq!(fetcher.fetch("https://c.test/", None).await.unwrap(), "slow");
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_unmatched_url_is_not_found() {
        let fetcher = ScriptedFetcher::new();
        let err = fetcher.fetch("https://nowhere.test", None).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
