//! Provider implementations for torrent search functionality.

use std::sync::Arc;

use async_trait::async_trait;
use trawl_core::Fetcher;

use crate::engine::{PagePlan, QueryEngine};
use crate::errors::SearchError;
use crate::extract::ExtractionStrategy;
use crate::policy::Throttle;
use crate::types::{Category, CategoryUrls, Record};

pub mod leetx;
pub mod limetorrents;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod rarbg;
pub mod sukebei;
pub mod thepiratebay;
pub mod torrentz;
pub mod yify;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{FailingProvider, StaticProvider};
pub use rarbg::RarbgProvider;

/// Trait for torrent search providers.
///
/// Identity is fixed at construction. Only policy state owned by the
/// provider (rate limiter clock, auth token) changes between searches.
#[async_trait]
pub trait TorrentProvider: Send + Sync + std::fmt::Debug {
    /// Unique, user-facing provider name.
    fn name(&self) -> &str;

    /// Site root the provider's templates are relative to.
    fn site(&self) -> &str;

    /// Per-category URL templates.
    fn categories(&self) -> &CategoryUrls;

    /// Searches for at most `count` records in `category`.
    ///
    /// Unsupported categories fall back to the All template.
    ///
    /// # Errors
    /// - `SearchError::MissingTemplate` - Neither the category nor All is supported
    /// - `SearchError::Fetch` - Single-request provider could not reach its source
    /// - `SearchError::Authentication` - Token-authenticated provider has no token
    /// - `SearchError::EmptyPayload` - Source stayed empty after a token refresh
    /// - `SearchError::Parse` - Source response could not be interpreted
    async fn search(
        &self,
        query: &str,
        count: usize,
        category: Category,
    ) -> Result<Vec<Record>, SearchError>;
}

/// Paging shape of a page-oriented provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// Records per page for category searches
    pub per_page: usize,
    /// Records per page when the All template is used, if it differs
    pub all_per_page: Option<usize>,
    /// Index of the first results page
    pub start_page: u32,
}

impl PageLayout {
    /// Layout with the same page size for every template.
    pub const fn uniform(per_page: usize, start_page: u32) -> Self {
        Self {
            per_page,
            all_per_page: None,
            start_page,
        }
    }

    /// Records per page for the resolved template.
    pub fn per_page_for(&self, is_all: bool) -> usize {
        match self.all_per_page {
            Some(per_page) if is_all => per_page,
            _ => self.per_page,
        }
    }
}

/// Provider that runs an extraction strategy over the paginated query engine.
///
/// Every HTML source, and the paged JSON source, is one of these configured
/// with its own templates, layout and policies.
#[derive(Debug)]
pub struct PaginatedProvider {
    name: String,
    site: String,
    categories: CategoryUrls,
    layout: PageLayout,
    strategy: Box<dyn ExtractionStrategy>,
    throttle: Option<Throttle>,
    max_count: Option<usize>,
    fetcher: Arc<dyn Fetcher>,
}

impl PaginatedProvider {
    /// Creates an unthrottled provider with no count cap.
    pub fn new(
        name: impl Into<String>,
        site: impl Into<String>,
        categories: CategoryUrls,
        layout: PageLayout,
        strategy: Box<dyn ExtractionStrategy>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            name: name.into(),
            site: site.into(),
            categories,
            layout,
            strategy,
            throttle: None,
            max_count: None,
            fetcher,
        }
    }

    /// Paces every page fetch through `throttle`.
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Never requests more than `max_count` records from the source.
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Paging shape of this provider.
    pub fn layout(&self) -> PageLayout {
        self.layout
    }
}

#[async_trait]
impl TorrentProvider for PaginatedProvider {
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
        query: &str,
        count: usize,
        category: Category,
    ) -> Result<Vec<Record>, SearchError> {
        let count = self.max_count.map_or(count, |max| count.min(max));
        let template = self.categories.get(category);
        let is_all = template.is_none() || template == self.categories.all.as_ref();

        let plan = PagePlan {
            provider: &self.name,
            site: &self.site,
            categories: &self.categories,
            template,
            desired: count,
            per_page: self.layout.per_page_for(is_all),
            start_page: self.layout.start_page,
        };

        QueryEngine::new(self.fetcher.as_ref())
            .with_throttle(self.throttle.as_ref())
            .query(query, plan, self.strategy.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use trawl_core::testing::ScriptedFetcher;

    use super::*;
    use crate::extract::PageContext;
    use crate::types::UrlTemplate;

    const SITE: &str = "https://paged.test";

    /// Emits one record per page, titled after the page index.
    #[derive(Debug)]
    struct OnePerPage;

    #[async_trait]
    impl ExtractionStrategy for OnePerPage {
        async fn extract(
            &self,
            _content: &str,
            page: &PageContext<'_>,
        ) -> Result<Vec<Record>, SearchError> {
            Ok(vec![Record {
                origin: page.provider.to_string(),
                title: format!("page {}", page.page),
                url: page.absolute_url(&format!("/p/{}", page.page)),
                seeders: 1,
                leechers: 0,
                size: 0,
                magnet: String::new(),
            }])
        }
    }

    fn provider(fetcher: Arc<dyn Fetcher>) -> PaginatedProvider {
        let categories = CategoryUrls {
            all: Some(UrlTemplate::new("/all/{query}/{page}")),
            movie: Some(UrlTemplate::new("/movie/{query}/{page}")),
            ..Default::default()
        };
        let layout = PageLayout {
            per_page: 40,
            all_per_page: Some(20),
            start_page: 0,
        };
        PaginatedProvider::new("Paged", SITE, categories, layout, Box::new(OnePerPage), fetcher)
    }

    #[test]
    fn test_layout_per_page() {
        let layout = PageLayout {
            per_page: 40,
            all_per_page: Some(20),
            start_page: 0,
        };
        assert_eq!(layout.per_page_for(true), 20);
        assert_eq!(layout.per_page_for(false), 40);
        assert_eq!(PageLayout::uniform(30, 0).per_page_for(true), 30);
    }

    #[tokio::test]
    async fn test_all_template_uses_all_page_size() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(SITE, "listing"));
        let provider = provider(fetcher.clone());

        provider.search("dune", 40, Category::All).await.unwrap();

        // 40 wanted at 20 per page: pages 0..=2
        assert_eq!(fetcher.calls_matching(&format!("{SITE}/all/dune/")), 3);
    }

    #[tokio::test]
    async fn test_category_template_uses_category_page_size() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(SITE, "listing"));
        let provider = provider(fetcher.clone());

        let records = provider.search("dune", 40, Category::Movie).await.unwrap();

        assert_eq!(fetcher.calls_matching(&format!("{SITE}/movie/dune/")), 2);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.origin == "Paged"));
    }

    #[tokio::test]
    async fn test_unsupported_category_falls_back_to_all() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(SITE, "listing"));
        let provider = provider(fetcher.clone());

        provider.search("dune", 10, Category::Anime).await.unwrap();

        assert_eq!(fetcher.calls_matching(&format!("{SITE}/all/dune/")), 2);
    }

    #[tokio::test]
    async fn test_max_count_caps_request() {
        let fetcher = Arc::new(ScriptedFetcher::new().respond(SITE, "listing"));
        let provider = provider(fetcher.clone()).with_max_count(1);

        let records = provider.search("dune", 400, Category::Movie).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.call_count(), 2);
    }
}
