//! Torrentz2: HTML `dl` rows; the detail link path is the info hash.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use trawl_core::Fetcher;

use super::{PageLayout, PaginatedProvider};
use crate::errors::SearchError;
use crate::extract::{
    ExtractionStrategy, PageContext, element_text, magnet_from_hash, parse_count, select_attr,
    select_text, selector,
};
use crate::size::parse_size;
use crate::types::{CategoryUrls, Record, UrlTemplate};

/// Provider name.
pub const NAME: &str = "Torrentz2";
/// Site root.
pub const SITE: &str = "https://torrentz2.eu";

/// Category templates; the site has a single search for everything.
pub fn categories() -> CategoryUrls {
    let search = UrlTemplate::new("/search?f={query}&p={page}");
    CategoryUrls {
        all: Some(search.clone()),
        movie: Some(search.clone()),
        tv: Some(search.clone()),
        anime: Some(search.clone()),
        adult: Some(search),
    }
}

/// Builds the provider.
pub fn new_provider(fetcher: Arc<dyn Fetcher>) -> PaginatedProvider {
    PaginatedProvider::new(
        NAME,
        SITE,
        categories(),
        PageLayout::uniform(50, 0),
        Box::new(TorrentzExtractor),
        fetcher,
    )
}

/// Extractor for `div.results` listings.
#[derive(Debug)]
pub struct TorrentzExtractor;

#[async_trait]
impl ExtractionStrategy for TorrentzExtractor {
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError> {
        let document = Html::parse_document(content);
        let rows = selector(NAME, "div.results dl")?;
        let link = selector(NAME, "dt a")?;
        let span = selector(NAME, "dd span")?;

        let records = document
            .select(&rows)
            .map(|row| {
                let href = select_attr(row, &link, "href").unwrap_or_default();
                let hash = href.trim_start_matches('/');
                // Spans: age marker, age, size, seeders, leechers
                let spans: Vec<String> = row.select(&span).map(element_text).collect();
                let span_text = |index: usize| spans.get(index).map_or("", String::as_str);

                Record {
                    origin: page.provider.to_string(),
                    title: select_text(row, &link),
                    url: page.absolute_url(href),
                    seeders: parse_count(span_text(3)),
                    leechers: parse_count(span_text(4)),
                    size: parse_size(span_text(2)),
                    magnet: if hash.is_empty() {
                        String::new()
                    } else {
                        magnet_from_hash(hash, None)
                    },
                }
            })
            .filter(Record::is_valid)
            .collect();

        Ok(records)
    }
}
