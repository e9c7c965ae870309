//! LimeTorrents: HTML rows; the magnet is rebuilt from the info hash in the
//! row's `.torrent` cache link.

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
pub const NAME: &str = "LimeTorrents";
/// Site root.
pub const SITE: &str = "https://www.limetorrents.info";

/// Category templates; no adult section.
pub fn categories() -> CategoryUrls {
    CategoryUrls {
        all: Some(UrlTemplate::new("/search/all/{query}/seeds/{page}")),
        movie: Some(UrlTemplate::new("/search/movies/{query}/seeds/{page}")),
        tv: Some(UrlTemplate::new("/search/tv/{query}/seeds/{page}")),
        anime: Some(UrlTemplate::new("/search/anime/{query}/seeds/{page}")),
        adult: None,
    }
}

/// Builds the provider.
pub fn new_provider(fetcher: Arc<dyn Fetcher>) -> PaginatedProvider {
    PaginatedProvider::new(
        NAME,
        SITE,
        categories(),
        PageLayout::uniform(50, 1),
        Box::new(LimeTorrentsExtractor),
        fetcher,
    )
}

/// Extractor for `table.table2` listings.
#[derive(Debug)]
pub struct LimeTorrentsExtractor;

#[async_trait]
impl ExtractionStrategy for LimeTorrentsExtractor {
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError> {
        let document = Html::parse_document(content);
        let rows = selector(NAME, "table.table2 tr")?;
        let name = selector(NAME, "div.tt-name")?;
        let title = selector(NAME, "div.tt-name a:not(.csprite_dl14)")?;
        let torrent = selector(NAME, "div.tt-name a.csprite_dl14")?;
        let normal = selector(NAME, "td.tdnormal")?;
        let seeds = selector(NAME, "td.tdseed")?;
        let leeches = selector(NAME, "td.tdleech")?;

        let records = document
            .select(&rows)
            .filter(|row| row.select(&name).next().is_some())
            .map(|row| {
                let magnet = select_attr(row, &torrent, "href")
                    .and_then(hash_from_torrent_link)
                    .map(|hash| magnet_from_hash(hash, None))
                    .unwrap_or_default();
                // First plain cell is the age, second the size
                let size = row.select(&normal).nth(1).map(element_text).unwrap_or_default();

                Record {
                    origin: page.provider.to_string(),
                    title: select_text(row, &title),
                    url: page.absolute_url(select_attr(row, &title, "href").unwrap_or_default()),
                    seeders: parse_count(&select_text(row, &seeds)),
                    leechers: parse_count(&select_text(row, &leeches)),
                    size: parse_size(&size),
                    magnet,
                }
            })
            .filter(Record::is_valid)
            .collect();

        Ok(records)
    }
}

/// Info hash from a cache link such as `http://itorrents.org/torrent/<HASH>.torrent?title=x`.
fn hash_from_torrent_link(href: &str) -> Option<&str> {
    let file = href.rsplit_once("/torrent/")?.1;
    let file = file.split('?').next().unwrap_or(file);
    let hash = file.trim_end_matches(".torrent");
    (!hash.is_empty()).then_some(hash)
}
