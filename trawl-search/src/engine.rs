//! Paginated query engine shared by page-oriented providers.
//!
//! Computes how many pages a request needs, fetches and extracts every page
//! concurrently, and joins on all of them. A failed page is logged and
//! contributes nothing; it never aborts its siblings. Each page task owns its
//! records and the engine concatenates them after the join.

use futures::future::join_all;
use trawl_core::Fetcher;

use crate::errors::SearchError;
use crate::extract::{ExtractionStrategy, PageContext};
use crate::policy::Throttle;
use crate::types::{CategoryUrls, Record, UrlTemplate};

/// Number of pages needed to collect `desired` records, at least one.
pub fn compute_page_count(desired: usize, per_page: usize) -> usize {
    desired.div_ceil(per_page.max(1)).max(1)
}

/// Shape of one paginated query against one provider.
#[derive(Debug, Clone, Copy)]
pub struct PagePlan<'a> {
    /// Provider name, for logs and record origin
    pub provider: &'a str,
    /// Site root the templates are relative to
    pub site: &'a str,
    /// Provider templates, used for the All fallback
    pub categories: &'a CategoryUrls,
    /// Resolved category template, `None` to use All
    pub template: Option<&'a UrlTemplate>,
    /// Records wanted
    pub desired: usize,
    /// Records the provider lists per page
    pub per_page: usize,
    /// Index of the provider's first page
    pub start_page: u32,
}

/// Runs paginated queries over a fetcher, optionally paced by a throttle.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    fetcher: &'a dyn Fetcher,
    throttle: Option<&'a Throttle>,
}

impl<'a> QueryEngine<'a> {
    /// Creates an engine issuing unpaced requests through `fetcher`.
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            throttle: None,
        }
    }

    /// Routes every page fetch through `throttle` when present.
    pub fn with_throttle(mut self, throttle: Option<&'a Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    /// Queries pages `start..=start + pages` and returns at most `desired` records.
    ///
    /// A zero `desired` returns immediately without touching the network.
    ///
    /// # Errors
    /// - `SearchError::MissingTemplate` - No category template and no All template
    pub async fn query(
        &self,
        text: &str,
        plan: PagePlan<'_>,
        strategy: &dyn ExtractionStrategy,
    ) -> Result<Vec<Record>, SearchError> {
        if plan.desired == 0 {
            return Ok(Vec::new());
        }

        let template = plan
            .template
            .or(plan.categories.all.as_ref())
            .ok_or_else(|| SearchError::MissingTemplate {
                provider: plan.provider.to_string(),
            })?;
        let encoded = urlencoding::encode(text);
        let pages = compute_page_count(plan.desired, plan.per_page);
        let last_page = plan
            .start_page
            .saturating_add(u32::try_from(pages).unwrap_or(u32::MAX));

        tracing::info!("{}: Getting search results in parallel...", plan.provider);
        tracing::debug!("{}: pages={}", plan.provider, pages);

        let site = plan.site.trim_end_matches('/');
        let tasks = (plan.start_page..=last_page).map(|page| {
            let url = format!("{site}{}", template.render(&encoded, page));
            self.run_page(url, page, plan, strategy)
        });
        let mut records: Vec<Record> = join_all(tasks).await.into_iter().flatten().collect();

        tracing::info!("{}: Found {} results", plan.provider, records.len());
        records.truncate(plan.desired);
        Ok(records)
    }

    async fn run_page(
        &self,
        url: String,
        page: u32,
        plan: PagePlan<'_>,
        strategy: &dyn ExtractionStrategy,
    ) -> Vec<Record> {
        tracing::info!("{}: [{}] Extracting results...", plan.provider, page);
        tracing::debug!("{}: [{}] url={}", plan.provider, page, url);

        let context = PageContext {
            provider: plan.provider,
            site: plan.site,
            page,
            fetcher: self.fetcher,
        };

        match self.fetch_and_extract(&url, &context, strategy).await {
            Ok(mut records) => {
                records.retain(Record::is_valid);
                tracing::debug!(
                    "{}: [{}] Amount of results: {}",
                    plan.provider,
                    page,
                    records.len()
                );
                records
            }
            Err(e) => {
                tracing::error!("{}: [{}] {}", plan.provider, page, e);
                Vec::new()
            }
        }
    }

    async fn fetch_and_extract(
        &self,
        url: &str,
        context: &PageContext<'_>,
        strategy: &dyn ExtractionStrategy,
    ) -> Result<Vec<Record>, SearchError> {
        let body = match self.throttle {
            Some(throttle) => throttle.fetch(self.fetcher, url).await?,
            None => self.fetcher.fetch(url, None).await?,
        };
        strategy.extract(&body, context).await
    }
}
