//! Multi-provider search orchestration.
//!
//! The aggregator resolves a provider selection once, runs every provider as
//! its own task, and waits for all of them. A provider that errors or panics
//! is logged and contributes nothing. Surviving results are merged in
//! selection order, sorted once and truncated to the requested count.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::errors::SearchError;
use crate::providers::TorrentProvider;
use crate::registry::ProviderRegistry;
use crate::types::{Category, Record, SortKey, sort_records};

/// Hard upper bound on the number of results of one search.
pub const MAX_RESULTS: usize = 500;

/// How a caller picks a provider.
#[derive(Debug, Clone)]
pub enum ProviderSelector {
    /// Registered provider, looked up by name ignoring case
    ByName(String),
    /// Provider instance supplied directly
    ByReference(Arc<dyn TorrentProvider>),
}

impl From<&str> for ProviderSelector {
    fn from(name: &str) -> Self {
        ProviderSelector::ByName(name.to_string())
    }
}

impl From<String> for ProviderSelector {
    fn from(name: String) -> Self {
        ProviderSelector::ByName(name)
    }
}

impl From<Arc<dyn TorrentProvider>> for ProviderSelector {
    fn from(provider: Arc<dyn TorrentProvider>) -> Self {
        ProviderSelector::ByReference(provider)
    }
}

/// One search invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,
    /// Records wanted, clamped to the aggregator's maximum
    pub count: usize,
    /// Abstract category
    pub category: Category,
    /// Ordering of the merged results
    pub sort: SortKey,
}

impl SearchRequest {
    /// Creates a request for all categories in provider order.
    pub fn new(query: impl Into<String>, count: usize) -> Self {
        Self {
            query: query.into(),
            count,
            category: Category::All,
            sort: SortKey::Default,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Sets the sort key.
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Builds a request from user-supplied category and sort text.
    ///
    /// # Errors
    /// - `SearchError::Configuration` - Unknown category or sort key
    pub fn parse(
        query: impl Into<String>,
        count: usize,
        category: &str,
        sort: &str,
    ) -> Result<Self, SearchError> {
        Ok(Self::new(query, count)
            .with_category(category.parse()?)
            .with_sort(sort.parse()?))
    }
}

/// Concurrent search across a selection of providers.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'r> {
    registry: &'r ProviderRegistry,
    max_results: usize,
}

impl<'r> Aggregator<'r> {
    /// Creates an aggregator resolving names against `registry`.
    pub fn new(registry: &'r ProviderRegistry) -> Self {
        Self {
            registry,
            max_results: MAX_RESULTS,
        }
    }

    /// Lowers the result cap; it never exceeds `MAX_RESULTS`.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.min(MAX_RESULTS);
        self
    }

    /// Resolves selectors to providers, in order.
    ///
    /// An empty selection means every registered provider. Unknown names and
    /// repeated providers are skipped with a warning.
    pub fn resolve(&self, selectors: &[ProviderSelector]) -> Vec<Arc<dyn TorrentProvider>> {
        if selectors.is_empty() {
            return self.registry.providers().to_vec();
        }

        let mut providers: Vec<Arc<dyn TorrentProvider>> = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let provider = match selector {
                ProviderSelector::ByName(name) => match self.registry.get(name) {
                    Some(provider) => provider.clone(),
                    None => {
                        tracing::warn!("Unknown provider '{}', skipping", name);
                        continue;
                    }
                },
                ProviderSelector::ByReference(provider) => provider.clone(),
            };

            if providers
                .iter()
                .any(|p| p.name().eq_ignore_ascii_case(provider.name()))
            {
                tracing::warn!("Provider {} selected twice, skipping", provider.name());
                continue;
            }
            providers.push(provider);
        }
        providers
    }

    /// Searches every selected provider and returns the merged results.
    ///
    /// Never fails: provider errors only shrink the result set, so an empty
    /// result may mean no matches or no working provider.
    pub async fn list_results(
        &self,
        selectors: &[ProviderSelector],
        request: &SearchRequest,
    ) -> Vec<Record> {
        let mut count = request.count;
        if count > self.max_results {
            tracing::warn!(
                "Requested {} results, limiting to {}",
                count,
                self.max_results
            );
            count = self.max_results;
        }
        if count == 0 {
            return Vec::new();
        }

        let providers = self.resolve(selectors);
        if providers.is_empty() {
            tracing::warn!("No providers to search");
            return Vec::new();
        }

        let mut tasks = JoinSet::new();
        for (index, provider) in providers.into_iter().enumerate() {
            if provider.categories().get(request.category).is_none() {
                tracing::warn!(
                    "{}: Category '{}' not supported, falling back to all",
                    provider.name(),
                    request.category
                );
            }

            let query = request.query.clone();
            let category = request.category;
            tasks.spawn(async move {
                let outcome = provider.search(&query, count, category).await;
                (index, provider.name().to_string(), outcome)
            });
        }

        let mut batches: Vec<(usize, Vec<Record>)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, name, Ok(records))) => {
                    if records.is_empty() {
                        tracing::warn!("{}: No results found", name);
                    } else {
                        tracing::info!("{}: Returned {} results", name, records.len());
                    }
                    batches.push((index, records));
                }
                Ok((_, name, Err(e))) => tracing::error!("{}: {}", name, e),
                Err(e) => tracing::error!("Provider task failed: {}", e),
            }
        }

        // Completion order is arbitrary; merge in selection order
        batches.sort_by_key(|(index, _)| *index);
        let mut results: Vec<Record> = batches
            .into_iter()
            .flat_map(|(_, records)| records)
            .filter(Record::is_valid)
            .collect();

        sort_records(&mut results, request.sort);
        results.truncate(count);
        results
    }

    /// Searches a single provider with the same guarantees as `list_results`.
    pub async fn list_provider_results(
        &self,
        selector: ProviderSelector,
        request: &SearchRequest,
    ) -> Vec<Record> {
        self.list_results(&[selector], request).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use proptest::prelude::*;

    use super::*;
    use crate::providers::{FailingProvider, StaticProvider};

    fn records(origin: &str, seeders: &[u32]) -> Vec<Record> {
        seeders
            .iter()
            .enumerate()
            .map(|(i, s)| StaticProvider::record(origin, &format!("{origin}-{i}"), *s))
            .collect()
    }

    fn by_ref(provider: impl TorrentProvider + 'static) -> ProviderSelector {
        ProviderSelector::ByReference(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_default_sort_keeps_selection_order() {
        let registry = ProviderRegistry::new();
        let slow = StaticProvider::new("Slow", records("Slow", &[1, 2]))
            .with_delay(Duration::from_millis(30));
        let fast = StaticProvider::new("Fast", records("Fast", &[9, 8]));

        let results = Aggregator::new(&registry)
            .list_results(&[by_ref(slow), by_ref(fast)], &SearchRequest::new("q", 10))
            .await;

        let origins: Vec<_> = results.iter().map(|r| r.origin.as_str()).collect();
        assert_eq!(origins, ["Slow", "Slow", "Fast", "Fast"]);
    }

    #[tokio::test]
    async fn test_providers_search_concurrently() {
        let registry = ProviderRegistry::new();
        let delay = Duration::from_millis(300);
        let first = StaticProvider::new("First", records("First", &[4])).with_delay(delay);
        let second = StaticProvider::new("Second", records("Second", &[6])).with_delay(delay);

        let started = Instant::now();
        let results = Aggregator::new(&registry)
            .list_results(&[by_ref(first), by_ref(second)], &SearchRequest::new("q", 10))
            .await;

        // Searching one provider after the other would take 600 ms
        assert!(started.elapsed() < Duration::from_millis(550));
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_sorts_then_truncates() {
        let registry = ProviderRegistry::new();
        let a = StaticProvider::new("A", records("A", &[5, 50, 7]));
        let b = StaticProvider::new("B", records("B", &[30, 1, 40]));
        let request = SearchRequest::new("q", 4).with_sort(SortKey::Seeders);

        let results = Aggregator::new(&registry)
            .list_results(&[by_ref(a), by_ref(b)], &request)
            .await;

        let seeders: Vec<_> = results.iter().map(|r| r.seeders).collect();
        assert_eq!(seeders, [50, 40, 30, 7]);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_providers_are_absorbed() {
        let registry = ProviderRegistry::new();
        let selectors = [
            by_ref(FailingProvider::new("Broken")),
            by_ref(StaticProvider::new("Good", records("Good", &[3, 2, 1]))),
            by_ref(FailingProvider::panicking("Crashy")),
        ];

        let results = Aggregator::new(&registry)
            .list_results(&selectors, &SearchRequest::new("q", 10))
            .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.origin == "Good"));
    }

    #[tokio::test]
    async fn test_count_is_clamped_to_max() {
        let registry = ProviderRegistry::new();
        let many: Vec<u32> = (1..=600).collect();
        let provider = StaticProvider::new("Many", records("Many", &many));

        let results = Aggregator::new(&registry)
            .list_results(&[by_ref(provider)], &SearchRequest::new("q", 1000))
            .await;

        assert_eq!(results.len(), MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_lower_max_results() {
        let registry = ProviderRegistry::new();
        let provider = StaticProvider::new("Some", records("Some", &[1, 2, 3, 4]));

        let results = Aggregator::new(&registry)
            .with_max_results(2)
            .list_results(&[by_ref(provider)], &SearchRequest::new("q", 10))
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(Aggregator::new(&registry).with_max_results(9000).max_results, MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_zero_count_searches_nothing() {
        let provider = Arc::new(StaticProvider::new("Idle", records("Idle", &[1])));
        let mut registry = ProviderRegistry::new();
        registry.register(provider.clone()).unwrap();

        let results = Aggregator::new(&registry)
            .list_results(&[], &SearchRequest::new("q", 0))
            .await;

        assert!(results.is_empty());
        assert_eq!(provider.searches(), 0);
    }

    #[tokio::test]
    async fn test_invalid_records_never_surface() {
        let registry = ProviderRegistry::new();
        let mut rows = records("Mixed", &[4, 0, 2]);
        rows[2].title.clear();
        let provider = StaticProvider::new("Mixed", rows);

        let results = Aggregator::new(&registry)
            .list_results(&[by_ref(provider)], &SearchRequest::new("q", 10))
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].seeders, 4);
    }

    #[tokio::test]
    async fn test_unsupported_category_still_searches_provider() {
        let registry = ProviderRegistry::new();
        let provider = Arc::new(StaticProvider::new("AllOnly", records("AllOnly", &[1])));
        let selector = ProviderSelector::from(provider.clone() as Arc<dyn TorrentProvider>);
        let request = SearchRequest::new("q", 5).with_category(Category::Anime);

        let results = Aggregator::new(&registry)
            .list_provider_results(selector, &request)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(provider.searches(), 1);
    }

    #[test]
    fn test_resolve_by_name() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(StaticProvider::new("Alpha", Vec::new())))
            .unwrap();
        registry
            .register(Arc::new(StaticProvider::new("Beta", Vec::new())))
            .unwrap();
        let aggregator = Aggregator::new(&registry);

        let names = |selectors: &[ProviderSelector]| -> Vec<String> {
            aggregator
                .resolve(selectors)
                .iter()
                .map(|p| p.name().to_string())
                .collect()
        };

        assert_eq!(names(&["beta".into(), "gamma".into(), "ALPHA".into()]), ["Beta", "Alpha"]);
        assert_eq!(names(&["alpha".into(), "Alpha".into()]), ["Alpha"]);
        assert_eq!(names(&[]), ["Alpha", "Beta"]);
    }

    #[test]
    fn test_request_parsing_is_configuration_boundary() {
        let request = SearchRequest::parse("ubuntu", 10, "tv", "size").unwrap();
        assert_eq!(request.category, Category::Tv);
        assert_eq!(request.sort, SortKey::Size);

        let bad_category = SearchRequest::parse("ubuntu", 10, "music", "size").unwrap_err();
        assert!(bad_category.is_configuration_fault());
        let bad_sort = SearchRequest::parse("ubuntu", 10, "all", "rating").unwrap_err();
        assert!(bad_sort.is_configuration_fault());
    }

    proptest! {
        #[test]
        fn prop_results_bounded_and_valid(
            a in proptest::collection::vec(0u32..100, 0..40),
            b in proptest::collection::vec(0u32..100, 0..40),
            count in 0usize..120,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let registry = ProviderRegistry::new();
            let selectors = [
                by_ref(StaticProvider::new("A", records("A", &a))),
                by_ref(StaticProvider::new("B", records("B", &b))),
            ];
            let request = SearchRequest::new("q", count).with_sort(SortKey::Seeders);

            let results = runtime
                .block_on(Aggregator::new(&registry).list_results(&selectors, &request));

            prop_assert!(results.len() <= count.min(MAX_RESULTS));
            prop_assert!(results.iter().all(Record::is_valid));
            prop_assert!(results.windows(2).all(|w| w[0].seeders >= w[1].seeders));
        }
    }
}
