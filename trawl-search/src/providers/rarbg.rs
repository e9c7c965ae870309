//! RARBG: token-authenticated JSON API with fixed result limits.
//!
//! The API token is kept in memory and persisted to the cache directory so
//! later runs can reuse it. A successful response that is empty, or that
//! reports a bad token, means the token went stale: it is refreshed once and
//! the search retried once. The API only accepts limits of 25, 50 or 100, so
//! the requested count is rounded up to a tier and the results truncated back.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use trawl_core::Fetcher;

use super::TorrentProvider;
use crate::errors::SearchError;
use crate::policy::{TokenCache, quantize_count};
use crate::types::{Category, CategoryUrls, Record, UrlTemplate};

/// Provider name.
pub const NAME: &str = "RARBG";
/// Site root.
pub const SITE: &str = "https://rarbg.to";
/// API root the category templates are relative to.
pub const API_URL: &str = "https://torrentapi.org";
/// Limits the API accepts.
pub const LIMIT_TIERS: [usize; 3] = [25, 50, 100];

const TOKEN_PATH: &str = "/pubapi_v2.php?get_token=get_token&app_id=trawl";

/// API error codes meaning the token is missing, invalid or expired.
const STALE_TOKEN_CODES: [u32; 3] = [1, 2, 4];

/// Category templates; the token is appended verbatim.
pub fn categories() -> CategoryUrls {
    let search = |filter: &str| {
        UrlTemplate::new(format!(
            "/pubapi_v2.php?mode=search&app_id=trawl&format=json_extended&search_string={{query}}{filter}&sort=seeders&limit={{limit}}&token="
        ))
    };

    CategoryUrls {
        all: Some(search("")),
        movie: Some(search("&category=14;17;42;44;45;46;47;48;50;51;52")),
        tv: Some(search("&category=1;18;41;49")),
        anime: None,
        adult: Some(search("&category=1;4")),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    torrent_results: Option<Vec<ApiTorrent>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiTorrent {
    #[serde(default)]
    title: String,
    #[serde(default)]
    download: String,
    #[serde(default)]
    seeders: u32,
    #[serde(default)]
    leechers: u32,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    info_page: String,
}

/// RARBG provider owning its auth token.
#[derive(Debug)]
pub struct RarbgProvider {
    fetcher: Arc<dyn Fetcher>,
    categories: CategoryUrls,
    token_cache: TokenCache,
    token: Mutex<Option<String>>,
}

impl RarbgProvider {
    /// Creates the provider, persisting its token under `cache_dir`.
    pub fn new(fetcher: Arc<dyn Fetcher>, cache_dir: &Path) -> Self {
        Self {
            fetcher,
            categories: categories(),
            token_cache: TokenCache::for_provider(cache_dir, NAME),
            token: Mutex::new(None),
        }
    }

    /// Persisted token location.
    pub fn token_cache(&self) -> &TokenCache {
        &self.token_cache
    }

    /// Current token: memory, then the token file, then the auth endpoint.
    ///
    /// With `refresh` set, always asks the auth endpoint.
    async fn token(&self, refresh: bool) -> Result<String, SearchError> {
        if !refresh {
            let cached = self.token.lock().clone();
            if let Some(token) = cached.or_else(|| self.token_cache.load()) {
                *self.token.lock() = Some(token.clone());
                return Ok(token);
            }
        }

        let token = self.request_token().await?;
        if let Err(e) = self.token_cache.store(&token) {
            tracing::warn!("{}: {}", NAME, e);
        }
        *self.token.lock() = Some(token.clone());
        Ok(token)
    }

    async fn request_token(&self) -> Result<String, SearchError> {
        tracing::info!("{}: Getting API token...", NAME);
        let authentication = |reason: String| SearchError::Authentication {
            provider: NAME.to_string(),
            reason,
        };

        let body = self
            .fetcher
            .fetch(&format!("{API_URL}{TOKEN_PATH}"), None)
            .await
            .map_err(|e| authentication(e.to_string()))?;
        let token = serde_json::from_str::<TokenResponse>(&body)
            .map(|response| response.token)
            .unwrap_or_default();

        if token.trim().is_empty() {
            return Err(authentication("no token in response".to_string()));
        }
        Ok(token.trim().to_string())
    }

    /// Runs one search request; `None` when the token proved stale.
    async fn request(&self, path: &str, token: &str) -> Result<Option<Vec<Record>>, SearchError> {
        tracing::info!("{}: Getting search results...", NAME);
        let url = format!("{API_URL}{path}{token}");
        tracing::debug!("{}: url={}", NAME, url);

        let body = self.fetcher.fetch(&url, None).await?;
        parse_response(&body)
    }
}

#[async_trait]
impl TorrentProvider for RarbgProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn site(&self) -> &str {
        SITE
    }

    fn categories(&self) -> &CategoryUrls {
        &self.categories
    }

    async fn search(
        &self,
        query: &str,
        count: usize,
        category: Category,
    ) -> Result<Vec<Record>, SearchError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let limit = quantize_count(count, &LIMIT_TIERS);
        tracing::debug!("{}: limit={}", NAME, limit);
        let template = self
            .categories
            .get_or_all(category)
            .ok_or_else(|| SearchError::MissingTemplate {
                provider: NAME.to_string(),
            })?;
        let path = template.render_with_limit(&urlencoding::encode(query), limit);

        let token = self.token(false).await?;
        let records = match self.request(&path, &token).await? {
            Some(records) => records,
            None => {
                tracing::warn!("{}: Token is stale, refreshing", NAME);
                let token = self.token(true).await?;
                self.request(&path, &token)
                    .await?
                    .ok_or_else(|| SearchError::EmptyPayload {
                        provider: NAME.to_string(),
                    })?
            }
        };

        tracing::info!("{}: Found {} results", NAME, records.len());
        Ok(records.into_iter().take(count).collect())
    }
}

/// Interprets a search response; `None` signals a stale token.
fn parse_response(body: &str) -> Result<Option<Vec<Record>>, SearchError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let response: ApiResponse = serde_json::from_str(body).map_err(|e| SearchError::Parse {
        provider: NAME.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(code) = response.error_code {
        if STALE_TOKEN_CODES.contains(&code) {
            return Ok(None);
        }
        // Anything else, e.g. 20 "No results found", is an empty listing
        tracing::debug!(
            "{}: API error {}: {}",
            NAME,
            code,
            response.error.unwrap_or_default()
        );
    }

    let records = response
        .torrent_results
        .unwrap_or_default()
        .into_iter()
        .map(|torrent| Record {
            origin: NAME.to_string(),
            title: torrent.title,
            url: torrent.info_page,
            seeders: torrent.seeders,
            leechers: torrent.leechers,
            size: torrent.size,
            magnet: torrent.download,
        })
        .filter(Record::is_valid)
        .collect();

    Ok(Some(records))
}
