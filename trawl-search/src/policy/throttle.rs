//! Request pacing for rate-limited providers.
//!
//! Every fetch waits for a permit from a direct governor limiter, allowing one
//! request per interval. Rejections that signal throttling (429/503) are
//! retried up to a fixed number of attempts; anything else is returned as is.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use trawl_core::{FetchResult, Fetcher};

/// One-request-per-interval limiter with bounded retry on throttling.
pub struct Throttle {
    limiter: DefaultDirectRateLimiter,
    interval: Duration,
    max_attempts: u32,
}

impl Throttle {
    /// Creates a throttle allowing one request per `interval`.
    ///
    /// A zero interval falls back to one request per second; `max_attempts`
    /// is raised to at least one.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));

        Self {
            limiter: RateLimiter::direct(quota),
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Maximum fetch attempts per URL.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetches `url` once a permit is available, retrying throttled attempts.
    ///
    /// # Errors
    /// - `FetchError` - Last error once attempts are exhausted, or the first
    ///   error that does not signal throttling
    pub async fn fetch(&self, fetcher: &dyn Fetcher, url: &str) -> FetchResult<String> {
        let mut attempt = 1;
        loop {
            self.limiter.until_ready().await;

            match fetcher.fetch(url, None).await {
                Err(e) if e.is_rate_limited() && attempt < self.max_attempts => {
                    tracing::warn!(
                        "Rate limited on {} (attempt {}/{}), retrying",
                        url,
                        attempt,
                        self.max_attempts
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
