//! Extraction strategy contract shared by all providers.
//!
//! A strategy turns the body of one fetched results page into records. HTML
//! is parsed synchronously; the only suspension points a strategy may add are
//! detail-page fetches through the page's `Fetcher`.

use async_trait::async_trait;
use scraper::{ElementRef, Selector};
use trawl_core::Fetcher;

use crate::errors::SearchError;
use crate::types::Record;

/// Everything a strategy knows about the page it is extracting.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Provider name, stamped into each record's origin
    pub provider: &'a str,
    /// Provider site root, used to absolutize relative links
    pub site: &'a str,
    /// Page index within the query
    pub page: u32,
    /// Fetcher for detail-page fan-out
    pub fetcher: &'a dyn Fetcher,
}

impl PageContext<'_> {
    /// Resolves a link found on the page against the provider site.
    pub fn absolute_url(&self, href: &str) -> String {
        absolute_url(self.site, href)
    }
}

/// Per-provider logic mapping fetched content to records.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync + std::fmt::Debug {
    /// Extracts validated records from one page body.
    ///
    /// Rows that fail `Record::is_valid` are dropped, never reported.
    ///
    /// # Errors
    /// - `SearchError::Parse` - The page as a whole could not be interpreted
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError>;
}

/// Joins a possibly relative link onto a site root.
pub fn absolute_url(site: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }

    let site = site.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{site}{href}")
    } else {
        format!("{site}/{href}")
    }
}

/// Parses a count cell, ignoring whitespace and thousands separators.
pub fn parse_count(text: &str) -> u32 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Builds a minimal magnet URI from an info hash and optional display name.
pub fn magnet_from_hash(hash: &str, name: Option<&str>) -> String {
    let mut magnet = format!("magnet:?xt=urn:btih:{}", hash.trim());
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        magnet.push_str("&dn=");
        magnet.push_str(&urlencoding::encode(name));
    }
    magnet
}

/// Compiles a CSS selector; a malformed one is a parse failure of `provider`.
///
/// # Errors
/// - `SearchError::Parse` - `css` is not a valid selector
pub fn selector(provider: &str, css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::Parse {
        provider: provider.to_string(),
        reason: format!("invalid selector '{css}': {e:?}"),
    })
}

/// All text below `element`, concatenated and trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the first element below `scope` matching `selector`, or empty.
pub fn select_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope.select(selector).next().map(element_text).unwrap_or_default()
}

/// Attribute of the first element below `scope` matching `selector`.
pub fn select_attr<'a>(scope: ElementRef<'a>, selector: &Selector, attr: &str) -> Option<&'a str> {
    scope.select(selector).next()?.value().attr(attr)
}
