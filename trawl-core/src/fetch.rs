//! Outbound HTTP fetch client.
//!
//! One GET per call, one shared connection pool and cookie jar across calls.
//! Failures are classified so that providers can decide on retry policy;
//! this layer never retries on its own.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, USER_AGENT};

use crate::FetchResult;
use crate::config::NetworkConfig;

/// Errors produced by a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Network, DNS, TLS or timeout failure before a response arrived.
    #[error("Transport failure for {url}: {reason}")]
    Transport {
        /// URL that was being fetched
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// Origin answered with a non-2xx status.
    #[error("Origin rejected {url}: {status} {status_text}")]
    OriginRejection {
        /// URL that was being fetched
        url: String,
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
    },

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client could not be built: {reason}")]
    Client {
        /// Builder error
        reason: String,
    },
}

impl FetchError {
    /// Checks if the origin signalled throttling (429 or 503).
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            FetchError::OriginRejection { status, .. } if *status == 429 || *status == 503
        )
    }

    /// HTTP status of an origin rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::OriginRejection { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Capability to fetch the body of a URL as text.
///
/// Implementations share connection state across calls and must be usable
/// from many concurrent tasks.
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Issues one GET request and returns the response body.
    ///
    /// # Errors
    /// - `FetchError::Transport` - Connection, DNS or timeout failure
    /// - `FetchError::OriginRejection` - Non-2xx response status
    async fn fetch(&self, url: &str, headers: Option<&HeaderMap>) -> FetchResult<String>;
}

/// Reqwest-backed fetcher with a cookie store and absolute per-call timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Creates a fetcher from network configuration.
    ///
    /// # Errors
    /// - `FetchError::Client` - TLS backend or builder initialization failed
    pub fn new(config: &NetworkConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Client {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, headers: Option<&HeaderMap>) -> FetchResult<String> {
        let mut request = self.client.get(url);

        let caller_set_agent = headers.is_some_and(|h| h.contains_key(USER_AGENT));
        if let Some(headers) = headers {
            request = request.headers(headers.clone());
        }
        if !caller_set_agent {
            request = request.header(USER_AGENT, self.user_agent.as_str());
        }

        tracing::trace!("GET {}", url);

        let response = request.send().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::OriginRejection {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            reason: format!("Failed to read body: {e}"),
        })
    }
}
