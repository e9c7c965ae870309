//! 1337x: HTML summary rows, magnet resolved from each row's detail page.
//!
//! The site throttles aggressively, so every listing fetch is paced to one
//! request per configured interval and retried on 429/503.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use scraper::Html;
use trawl_core::{Fetcher, SearchConfig};

use super::{PageLayout, PaginatedProvider};
use crate::errors::SearchError;
use crate::extract::{
    ExtractionStrategy, PageContext, parse_count, select_attr, select_text, selector,
};
use crate::policy::Throttle;
use crate::size::parse_size;
use crate::types::{CategoryUrls, Record, UrlTemplate};

/// Provider name.
pub const NAME: &str = "1337x";
/// Site root.
pub const SITE: &str = "https://1337x.to";

/// Category templates.
pub fn categories() -> CategoryUrls {
    CategoryUrls {
        all: Some(UrlTemplate::new("/search/{query}/{page}/")),
        movie: Some(UrlTemplate::new("/category-search/{query}/Movies/{page}/")),
        tv: Some(UrlTemplate::new("/category-search/{query}/TV/{page}/")),
        anime: Some(UrlTemplate::new("/category-search/{query}/Anime/{page}/")),
        adult: Some(UrlTemplate::new("/category-search/{query}/XXX/{page}/")),
    }
}

/// Builds the provider with pacing from `config`.
pub fn new_provider(fetcher: Arc<dyn Fetcher>, config: &SearchConfig) -> PaginatedProvider {
    let layout = PageLayout {
        per_page: 40,
        all_per_page: Some(20),
        start_page: 0,
    };
    let throttle = Throttle::new(config.rate_limit_interval, config.rate_limit_attempts);

    PaginatedProvider::new(NAME, SITE, categories(), layout, Box::new(LeetxExtractor), fetcher)
        .with_throttle(throttle)
}

/// Two-level extractor: listing rows, then one detail fetch per row.
#[derive(Debug)]
pub struct LeetxExtractor;

#[async_trait]
impl ExtractionStrategy for LeetxExtractor {
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError> {
        let summaries = parse_listing(content, page)?;
        tracing::debug!(
            "{}: [{}] Getting magnets for {} rows in parallel...",
            page.provider,
            page.page,
            summaries.len()
        );

        let lookups = summaries
            .into_iter()
            .map(|record| resolve_magnet(record, page));
        let resolved = join_all(lookups).await;
        Ok(resolved.into_iter().flatten().collect())
    }
}

/// Summary rows carrying everything but the magnet.
fn parse_listing(content: &str, page: &PageContext<'_>) -> Result<Vec<Record>, SearchError> {
    let document = Html::parse_document(content);
    let rows = selector(NAME, "table.table-list tr")?;
    let name = selector(NAME, "td.coll-1.name")?;
    let seeds = selector(NAME, "td.coll-2.seeds")?;
    let leeches = selector(NAME, "td.coll-3.leeches")?;
    let size = selector(NAME, "td.coll-4.size")?;
    let link = selector(NAME, r#"a[href^="/torrent"]"#)?;

    let records = document
        .select(&rows)
        .filter_map(|row| {
            let href = select_attr(row, &link, "href")?;
            // Size cell trails a child span; only its leading text is the size
            let size_text = row
                .select(&size)
                .next()
                .and_then(|cell| cell.text().next())
                .unwrap_or_default();

            Some(Record {
                origin: page.provider.to_string(),
                title: select_text(row, &name),
                url: page.absolute_url(href),
                seeders: parse_count(&select_text(row, &seeds)),
                leechers: parse_count(&select_text(row, &leeches)),
                size: parse_size(size_text),
                magnet: String::new(),
            })
        })
        .filter(Record::is_valid)
        .collect();

    Ok(records)
}

/// Fills in the magnet from the detail page; a failed fetch drops the row.
async fn resolve_magnet(mut record: Record, page: &PageContext<'_>) -> Option<Record> {
    match page.fetcher.fetch(&record.url, None).await {
        Ok(html) => {
            record.magnet = parse_magnet(&html).unwrap_or_default();
            Some(record)
        }
        Err(e) => {
            tracing::error!("{}: [{}] {}", page.provider, page.page, e);
            None
        }
    }
}

fn parse_magnet(content: &str) -> Option<String> {
    let document = Html::parse_document(content);
    let magnet = selector(NAME, r#"a[href^="magnet:"]"#).ok()?;

    document
        .select(&magnet)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}
