//! Integration tests for the built-in providers.
//!
//! These tests run the default registry through the aggregator against a
//! scripted fetcher serving canned pages, covering URL construction, paging,
//! extraction and the token flow end to end.

use std::sync::Arc;

use tempfile::TempDir;
use trawl_core::TrawlConfig;
use trawl_core::testing::ScriptedFetcher;
use trawl_search::{
    Aggregator, Category, ProviderRegistry, ProviderSelector, SearchRequest, SortKey,
};

const PIRATEBAY_PAGE: &str = r#"
    <table id="searchResult"><tbody>
      <tr>
        <td class="vertTh">Applications</td>
        <td><div class="detName"><a href="/torrent/1/Ubuntu_Desktop" class="detLink">Ubuntu Desktop</a></div>
            <a href="magnet:?xt=urn:btih:AAA">M</a>
            <font class="detDesc">Uploaded 04-21, Size 3.4 GiB, ULed by canonical</font></td>
        <td>300</td><td>12</td>
      </tr>
      <tr>
        <td class="vertTh">Applications</td>
        <td><div class="detName"><a href="/torrent/2/Ubuntu_Server" class="detLink">Ubuntu Server</a></div>
            <a href="magnet:?xt=urn:btih:BBB">M</a>
            <font class="detDesc">Uploaded 04-21, Size 1.4 GiB, ULed by canonical</font></td>
        <td>45</td><td>3</td>
      </tr>
    </tbody></table>"#;

const LIMETORRENTS_PAGE: &str = r#"
    <table class="table2">
      <tr>
        <td><div class="tt-name">
          <a href="http://itorrents.org/torrent/CCC.torrent?title=x" class="csprite_dl14"></a>
          <a href="/Xubuntu-torrent-3.html">Xubuntu</a>
        </div></td>
        <td class="tdnormal">1 day ago</td><td class="tdnormal">2.1 GB</td>
        <td class="tdseed">120</td><td class="tdleech">8</td>
      </tr>
    </table>"#;

const LEETX_PAGE: &str = r#"
    <table class="table-list table table-responsive table-striped"><tbody>
      <tr>
        <td class="coll-1 name"><a href="/torrent/77/lubuntu/">Lubuntu</a></td>
        <td class="coll-2 seeds">64</td>
        <td class="coll-3 leeches">5</td>
        <td class="coll-4 size">2.9 GB<span class="seeds">64</span></td>
      </tr>
    </tbody></table>"#;

const LEETX_DETAIL: &str = r#"<ul class="dropdown-menu"><li><a href="magnet:?xt=urn:btih:DDD">Magnet</a></li></ul>"#;

/// Test fixture wiring the default registry to a scripted fetcher.
struct SearchFixture {
    fetcher: Arc<ScriptedFetcher>,
    registry: ProviderRegistry,
    _cache_dir: TempDir,
}

impl SearchFixture {
    /// Creates a fixture serving canned pages for several providers.
    fn new() -> Self {
        let fetcher = ScriptedFetcher::new()
            .respond("https://thepiratebay.org/search/ubuntu/", PIRATEBAY_PAGE)
            .respond("https://www.limetorrents.info/search/all/ubuntu/", LIMETORRENTS_PAGE)
            .respond("https://1337x.to/search/ubuntu/", LEETX_PAGE)
            .respond("https://1337x.to/torrent/", LEETX_DETAIL)
            .respond(
                "https://torrentapi.org/pubapi_v2.php?get_token=",
                r#"{"token": "abc123"}"#,
            )
            .respond(
                "https://torrentapi.org/pubapi_v2.php?mode=search",
                r#"{"torrent_results": [
                    {"title": "Ubuntu.22.04.iso", "download": "magnet:?xt=urn:btih:EEE", "seeders": 210, "leechers": 4, "size": 3600000000, "info_page": "https://torrentapi.org/info/1"}
                ]}"#,
            );
        Self::with_fetcher(fetcher)
    }

    fn with_fetcher(fetcher: ScriptedFetcher) -> Self {
        let cache_dir = tempfile::tempdir().unwrap();
        let config = TrawlConfig::for_testing(cache_dir.path());
        let fetcher = Arc::new(fetcher);
        let registry = ProviderRegistry::with_defaults(fetcher.clone(), &config);

        Self {
            fetcher,
            registry,
            _cache_dir: cache_dir,
        }
    }

    async fn search(
        &self,
        providers: &[&str],
        request: SearchRequest,
    ) -> Vec<trawl_search::Record> {
        let selectors: Vec<ProviderSelector> = providers.iter().map(|&name| name.into()).collect();
        Aggregator::new(&self.registry)
            .list_results(&selectors, &request)
            .await
    }
}

#[tokio::test]
async fn test_html_providers_merge_and_sort() {
    let fixture = SearchFixture::new();
    let request = SearchRequest::new("ubuntu", 3).with_sort(SortKey::Seeders);

    let results = fixture
        .search(&["ThePirateBay", "LimeTorrents"], request)
        .await;

    let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Ubuntu Desktop", "Ubuntu Desktop", "Xubuntu"]);
    assert_eq!(results[2].origin, "LimeTorrents");
    assert_eq!(results[2].magnet, "magnet:?xt=urn:btih:CCC");
}

#[tokio::test]
async fn test_token_provider_through_registry() {
    let fixture = SearchFixture::new();

    let results = fixture
        .search(&["rarbg"], SearchRequest::new("ubuntu", 10))
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].origin, "RARBG");
    assert_eq!(
        fixture
            .fetcher
            .calls_matching("https://torrentapi.org/pubapi_v2.php?get_token="),
        1
    );
    let search_url = fixture
        .fetcher
        .calls()
        .into_iter()
        .find(|url| url.contains("mode=search"))
        .unwrap();
    assert!(search_url.ends_with("&limit=25&token=abc123"));
}

#[tokio::test]
async fn test_detail_fanout_provider_through_registry() {
    let fixture = SearchFixture::new();

    let results = fixture
        .search(&["1337x"], SearchRequest::new("ubuntu", 5))
        .await;

    // Two listing pages with one row each, every row resolved via its detail page
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.magnet == "magnet:?xt=urn:btih:DDD"));
    assert_eq!(fixture.fetcher.calls_matching("https://1337x.to/search/ubuntu/"), 2);
    assert_eq!(fixture.fetcher.calls_matching("https://1337x.to/torrent/77/"), 2);
}

#[tokio::test]
async fn test_unsupported_category_falls_back_to_all() {
    let fixture = SearchFixture::new();
    let request = SearchRequest::new("ubuntu", 2).with_category(Category::Adult);

    let results = fixture.search(&["LimeTorrents"], request).await;

    assert_eq!(results.len(), 2);
    assert_eq!(
        fixture
            .fetcher
            .calls_matching("https://www.limetorrents.info/search/all/ubuntu/seeds/"),
        2
    );
}

#[tokio::test]
async fn test_unreachable_sources_yield_empty_result() {
    let fixture = SearchFixture::with_fetcher(ScriptedFetcher::new());

    let results = fixture.search(&[], SearchRequest::new("ubuntu", 20)).await;

    assert!(results.is_empty());
    assert!(fixture.fetcher.call_count() > 0);
}
