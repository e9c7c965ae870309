//! ThePirateBay: HTML result rows with an inline magnet link.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;
use trawl_core::Fetcher;

use super::{PageLayout, PaginatedProvider};
use crate::errors::SearchError;
use crate::extract::{
    ExtractionStrategy, PageContext, element_text, parse_count, select_attr, select_text,
    selector,
};
use crate::size::parse_size;
use crate::types::{CategoryUrls, Record, UrlTemplate};

/// Provider name.
pub const NAME: &str = "ThePirateBay";
/// Site root.
pub const SITE: &str = "https://thepiratebay.org";

static SIZE_IN_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Size\s(.*?),").expect("description size pattern is valid"));

/// Category templates; movies and TV share the video section.
pub fn categories() -> CategoryUrls {
    CategoryUrls {
        all: Some(UrlTemplate::new("/search/{query}/{page}/99/0")),
        movie: Some(UrlTemplate::new("/search/{query}/{page}/99/200")),
        tv: Some(UrlTemplate::new("/search/{query}/{page}/99/200")),
        anime: None,
        adult: Some(UrlTemplate::new("/search/{query}/{page}/99/500")),
    }
}

/// Builds the provider.
pub fn new_provider(fetcher: Arc<dyn Fetcher>) -> PaginatedProvider {
    PaginatedProvider::new(
        NAME,
        SITE,
        categories(),
        PageLayout::uniform(30, 0),
        Box::new(PirateBayExtractor),
        fetcher,
    )
}

/// Extractor for `table#searchResult` listings.
#[derive(Debug)]
pub struct PirateBayExtractor;

#[async_trait]
impl ExtractionStrategy for PirateBayExtractor {
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError> {
        let document = Html::parse_document(content);
        let rows = selector(NAME, "table#searchResult tr")?;
        let cell = selector(NAME, "td")?;
        let title = selector(NAME, "a.detLink")?;
        let magnet = selector(NAME, r#"a[href^="magnet:"]"#)?;
        let description = selector(NAME, "font.detDesc")?;

        let records = document
            .select(&rows)
            .filter_map(|row| {
                let cells: Vec<_> = row.select(&cell).collect();
                let (main, seeds, leeches) = (*cells.get(1)?, *cells.get(2)?, *cells.get(3)?);
                let details = select_text(main, &description);

                Some(Record {
                    origin: page.provider.to_string(),
                    title: select_text(main, &title),
                    url: page.absolute_url(select_attr(main, &title, "href").unwrap_or_default()),
                    seeders: parse_count(&element_text(seeds)),
                    leechers: parse_count(&element_text(leeches)),
                    size: size_from_description(&details),
                    magnet: select_attr(main, &magnet, "href")
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .filter(Record::is_valid)
            .collect();

        Ok(records)
    }
}

/// Pulls the size out of text like `"Uploaded 03-14, Size 1.2 GiB, ULed by x"`.
fn size_from_description(text: &str) -> u64 {
    SIZE_IN_DESCRIPTION
        .captures(text)
        .map_or(0, |captures| parse_size(&captures[1]))
}
