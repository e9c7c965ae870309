//! Sukebei: HTML torrent table with inline magnets; adult content only.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Html;
use trawl_core::Fetcher;

use super::{PageLayout, PaginatedProvider};
use crate::errors::SearchError;
use crate::extract::{ExtractionStrategy, PageContext, element_text, parse_count, selector};
use crate::size::parse_size;
use crate::types::{CategoryUrls, Record, UrlTemplate};

/// Provider name.
pub const NAME: &str = "Sukebei";
/// Site root.
pub const SITE: &str = "https://sukebei.nyaa.si";

/// Category templates.
pub fn categories() -> CategoryUrls {
    let search = UrlTemplate::new("/?f=0&c=0_0&q={query}&s=seeders&o=desc&p={page}");
    CategoryUrls {
        all: Some(search.clone()),
        adult: Some(search),
        ..Default::default()
    }
}

/// Builds the provider.
pub fn new_provider(fetcher: Arc<dyn Fetcher>) -> PaginatedProvider {
    PaginatedProvider::new(
        NAME,
        SITE,
        categories(),
        PageLayout::uniform(75, 1),
        Box::new(SukebeiExtractor),
        fetcher,
    )
}

/// Extractor for `table.torrent-list` listings.
#[derive(Debug)]
pub struct SukebeiExtractor;

#[async_trait]
impl ExtractionStrategy for SukebeiExtractor {
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError> {
        let document = Html::parse_document(content);
        let rows = selector(NAME, "table.torrent-list tbody tr")?;
        let cell = selector(NAME, "td.text-center")?;
        let title = selector(NAME, "td[colspan] a:not(.comments)")?;
        let magnet = selector(NAME, r#"a[href^="magnet:"]"#)?;

        let records = document
            .select(&rows)
            .filter_map(|row| {
                // Centered cells: links, size, date, seeders, leechers, downloads
                let cells: Vec<_> = row.select(&cell).collect();
                let text = |index: usize| {
                    cells
                        .get(index)
                        .map(|cell| element_text(*cell))
                        .unwrap_or_default()
                };
                // Comment counters precede the title link
                let link = row.select(&title).last()?;

                Some(Record {
                    origin: page.provider.to_string(),
                    title: element_text(link),
                    url: page.absolute_url(link.value().attr("href").unwrap_or_default()),
                    seeders: parse_count(&text(3)),
                    leechers: parse_count(&text(4)),
                    size: parse_size(&text(1)),
                    magnet: cells
                        .first()
                        .and_then(|c| c.select(&magnet).next())
                        .and_then(|a| a.value().attr("href"))
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .filter(Record::is_valid)
            .collect();

        Ok(records)
    }
}
