//! Mock providers for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::TorrentProvider;
use crate::errors::SearchError;
use crate::types::{Category, CategoryUrls, Record, UrlTemplate};

/// Provider returning a fixed record list, truncated to the requested count.
#[derive(Debug)]
pub struct StaticProvider {
    name: String,
    site: String,
    categories: CategoryUrls,
    records: Vec<Record>,
    delay: Duration,
    searches: AtomicUsize,
}

impl StaticProvider {
    /// Creates a provider that serves `records` for every query.
    pub fn new(name: &str, records: Vec<Record>) -> Self {
        Self {
            name: name.to_string(),
            site: format!("https://{}.test", name.to_lowercase()),
            categories: CategoryUrls {
                all: Some(UrlTemplate::new("/search/{query}/{page}")),
                ..Default::default()
            },
            records,
            delay: Duration::ZERO,
            searches: AtomicUsize::new(0),
        }
    }

    /// Delays every search by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the category templates.
    pub fn with_categories(mut self, categories: CategoryUrls) -> Self {
        self.categories = categories;
        self
    }

    /// Number of searches served so far.
    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    /// Builds a record attributed to `origin` for fixtures.
    pub fn record(origin: &str, title: &str, seeders: u32) -> Record {
        Record {
            origin: origin.to_string(),
            title: title.to_string(),
            url: format!("https://{}.test/t/{}", origin.to_lowercase(), title),
            seeders,
            leechers: seeders / 2,
            size: u64::from(seeders) * 1024 * 1024,
            magnet: format!("magnet:?xt=urn:btih:{title}"),
        }
    }
}

#[async_trait]
impl TorrentProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn site(&self) -> &str {
        &self.site
    }

    fn categories(&self) -> &CategoryUrls {
        &self.categories
    }

    async fn search(
        &self,
        _query: &str,
        count: usize,
        _category: Category,
    ) -> Result<Vec<Record>, SearchError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.records.iter().take(count).cloned().collect())
    }
}

/// Provider whose every search fails, or panics when asked to.
#[derive(Debug)]
pub struct FailingProvider {
    name: String,
    categories: CategoryUrls,
    panics: bool,
}

impl FailingProvider {
    /// Creates a provider failing with a transport error.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            categories: CategoryUrls {
                all: Some(UrlTemplate::new("/search/{query}/{page}")),
                ..Default::default()
            },
            panics: false,
        }
    }

    /// Creates a provider whose search task panics.
    pub fn panicking(name: &str) -> Self {
        Self {
            panics: true,
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl TorrentProvider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn site(&self) -> &str {
        "https://failing.test"
    }

    fn categories(&self) -> &CategoryUrls {
        &self.categories
    }

    async fn search(
        &self,
        _query: &str,
        _count: usize,
        _category: Category,
    ) -> Result<Vec<Record>, SearchError> {
        if self.panics {
            panic!("{} crashed mid-search", self.name);
        }
        Err(SearchError::Fetch(trawl_core::FetchError::Transport {
            url: self.site().to_string(),
            reason: "connection refused".to_string(),
        }))
    }
}
