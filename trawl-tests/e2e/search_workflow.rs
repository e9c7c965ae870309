//! End-to-end search workflow
//!
//! Runs whole searches the way the CLI does: registry, aggregator, real
//! provider extractors and policies, with a scripted fetcher as the network.

use std::sync::Arc;

use tempfile::TempDir;
use trawl_core::TrawlConfig;
use trawl_core::testing::{ScriptedFetcher, ScriptedReply};
use trawl_search::providers::{
    FailingProvider, RarbgProvider, StaticProvider, limetorrents, thepiratebay,
};
use trawl_search::{
    Aggregator, Category, ProviderRegistry, ProviderSelector, Record, SearchRequest, SortKey,
};

const PIRATEBAY_FIRST_PAGE: &str = "https://thepiratebay.org/search/ubuntu/0/99/0";
const PIRATEBAY_SECOND_PAGE: &str = "https://thepiratebay.org/search/ubuntu/1/99/0";
const LIMETORRENTS_FIRST_PAGE: &str = "https://www.limetorrents.info/search/all/ubuntu/seeds/1";
const LIMETORRENTS_SECOND_PAGE: &str = "https://www.limetorrents.info/search/all/ubuntu/seeds/2";

fn piratebay_listing(seeders: &[u32]) -> String {
    let rows: String = seeders
        .iter()
        .enumerate()
        .map(|(index, seeds)| {
            format!(
                r#"<tr>
                  <td class="vertTh">Applications</td>
                  <td><div class="detName"><a href="/torrent/{index}/ubuntu" class="detLink">Ubuntu build {index}</a></div>
                      <a href="magnet:?xt=urn:btih:TPB{index}">M</a>
                      <font class="detDesc">Uploaded 04-21, Size 1.5 GiB, ULed by canonical</font></td>
                  <td>{seeds}</td><td>1</td>
                </tr>"#
            )
        })
        .collect();

    format!(r#"<table id="searchResult"><tbody>{rows}</tbody></table>"#)
}

fn limetorrents_listing(seeders: &[u32]) -> String {
    let rows: String = seeders
        .iter()
        .enumerate()
        .map(|(index, seeds)| {
            format!(
                r#"<tr>
                  <td><div class="tt-name">
                    <a href="http://itorrents.org/torrent/LIME{index}.torrent?title=x" class="csprite_dl14"></a>
                    <a href="/Ubuntu-mirror-{index}.html">Ubuntu mirror {index}</a>
                  </div></td>
                  <td class="tdnormal">1 day ago</td><td class="tdnormal">2.0 GB</td>
                  <td class="tdseed">{seeds}</td><td class="tdleech">2</td>
                </tr>"#
            )
        })
        .collect();

    format!(r#"<table class="table2">{rows}</table>"#)
}

/// Two scraped providers behind one scripted network.
///
/// ThePirateBay serves eight seeded rows on its first page and nothing on the
/// second. LimeTorrents serves five rows, three of them unseeded, and its
/// second page fails at the transport level.
struct Workflow {
    fetcher: Arc<ScriptedFetcher>,
    registry: ProviderRegistry,
}

impl Workflow {
    fn new() -> Self {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .respond(
                    PIRATEBAY_FIRST_PAGE,
                    piratebay_listing(&[40, 800, 300, 120, 75, 610, 9, 210]),
                )
                .respond(PIRATEBAY_SECOND_PAGE, piratebay_listing(&[]))
                .respond(LIMETORRENTS_FIRST_PAGE, limetorrents_listing(&[0, 250, 0, 5, 0]))
                .fail(LIMETORRENTS_SECOND_PAGE),
        );

        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(thepiratebay::new_provider(fetcher.clone())))
            .unwrap();
        registry
            .register(Arc::new(limetorrents::new_provider(fetcher.clone())))
            .unwrap();

        Self { fetcher, registry }
    }

    async fn search(&self, request: SearchRequest) -> Vec<Record> {
        Aggregator::new(&self.registry)
            .list_results(&[], &request)
            .await
    }
}

#[tokio::test]
async fn test_partial_failure_still_fills_the_request() {
    let workflow = Workflow::new();
    let request = SearchRequest::new("ubuntu", 10)
        .with_category(Category::All)
        .with_sort(SortKey::Seeders);

    let results = workflow.search(request).await;

    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| r.seeders > 0));
    assert!(results.windows(2).all(|w| w[0].seeders >= w[1].seeders));

    let seeders: Vec<u32> = results.iter().map(|r| r.seeders).collect();
    assert_eq!(seeders, [800, 610, 300, 250, 210, 120, 75, 40, 9, 5]);

    let lime: Vec<_> = results
        .iter()
        .filter(|r| r.origin == limetorrents::NAME)
        .collect();
    assert_eq!(lime.len(), 2);
    assert!(lime.iter().all(|r| r.magnet.starts_with("magnet:?xt=urn:btih:LIME")));

    assert_eq!(workflow.fetcher.calls_matching(LIMETORRENTS_SECOND_PAGE), 1);
}

#[tokio::test]
async fn test_default_order_concatenates_in_selection_order() {
    let workflow = Workflow::new();

    let results = workflow.search(SearchRequest::new("ubuntu", 10)).await;

    let origins: Vec<&str> = results.iter().map(|r| r.origin.as_str()).collect();
    assert_eq!(origins[..8], [thepiratebay::NAME; 8]);
    assert_eq!(origins[8..], [limetorrents::NAME; 2]);
    // Listing order is kept within a provider
    assert_eq!(results[0].seeders, 40);
    assert_eq!(results[8].seeders, 250);
}

#[tokio::test]
async fn test_each_provider_is_truncated_before_merging() {
    let workflow = Workflow::new();
    let request = SearchRequest::new("ubuntu", 3).with_sort(SortKey::Seeders);

    let results = workflow.search(request).await;

    // ThePirateBay contributes only its first three listed rows
    let seeders: Vec<u32> = results.iter().map(|r| r.seeders).collect();
    assert_eq!(seeders, [800, 300, 250]);
}

#[tokio::test]
async fn test_failing_provider_does_not_suppress_others() {
    let mut registry = ProviderRegistry::new();
    registry
        .register(Arc::new(FailingProvider::new("Offline")))
        .unwrap();
    registry
        .register(Arc::new(StaticProvider::new(
            "Local",
            vec![
                StaticProvider::record("Local", "debian", 30),
                StaticProvider::record("Local", "fedora", 90),
            ],
        )))
        .unwrap();

    let selectors: Vec<ProviderSelector> = vec!["Offline".into(), "Local".into()];
    let request = SearchRequest::new("linux", 5).with_sort(SortKey::Seeders);
    let results = Aggregator::new(&registry)
        .list_results(&selectors, &request)
        .await;

    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["fedora", "debian"]);
}

#[tokio::test]
async fn test_token_survives_between_runs() {
    let cache_dir = TempDir::new().unwrap();
    let search_body = r#"{"torrent_results": [
        {"title": "Ubuntu.24.04.iso", "download": "magnet:?xt=urn:btih:FFF", "seeders": 77, "leechers": 3, "size": 5800000000, "info_page": "https://torrentapi.org/info/9"}
    ]}"#;

    // First run fetches a token and persists it
    let first = Arc::new(
        ScriptedFetcher::new()
            .respond(
                "https://torrentapi.org/pubapi_v2.php?get_token=",
                r#"{"token": "persisted"}"#,
            )
            .respond("https://torrentapi.org/pubapi_v2.php?mode=search", search_body),
    );
    let mut registry = ProviderRegistry::new();
    registry
        .register(Arc::new(RarbgProvider::new(first.clone(), cache_dir.path())))
        .unwrap();
    let results = Aggregator::new(&registry)
        .list_results(&[], &SearchRequest::new("ubuntu", 10))
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(first.calls_matching("https://torrentapi.org/pubapi_v2.php?get_token="), 1);

    // Second run reads it back from the cache directory
    let second = Arc::new(
        ScriptedFetcher::new()
            .script(
                "https://torrentapi.org/pubapi_v2.php?get_token=",
                vec![ScriptedReply::Status(500)],
            )
            .respond("https://torrentapi.org/pubapi_v2.php?mode=search", search_body),
    );
    let mut registry = ProviderRegistry::new();
    registry
        .register(Arc::new(RarbgProvider::new(second.clone(), cache_dir.path())))
        .unwrap();
    let results = Aggregator::new(&registry)
        .list_results(&[], &SearchRequest::new("ubuntu", 10))
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].magnet, "magnet:?xt=urn:btih:FFF");
    assert_eq!(second.calls_matching("https://torrentapi.org/pubapi_v2.php?get_token="), 0);
    assert!(second.calls()[0].ends_with("&token=persisted"));
}

#[tokio::test]
async fn test_full_default_registry_builds_from_config() {
    let cache_dir = TempDir::new().unwrap();
    let config = TrawlConfig::for_testing(cache_dir.path());
    let registry = ProviderRegistry::with_defaults(Arc::new(ScriptedFetcher::new()), &config);

    let request = SearchRequest::parse("ubuntu", 5, "movie", "size").unwrap();
    let results = Aggregator::new(&registry).list_results(&[], &request).await;

    assert!(results.is_empty());
    assert_eq!(registry.len(), 7);
}
