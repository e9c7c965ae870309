//! YIFY: paged JSON movie API, one record per movie torrent quality.
//!
//! The API returns nothing for large limits, so requests are capped at 20
//! records.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use trawl_core::Fetcher;

use super::{PageLayout, PaginatedProvider};
use crate::errors::SearchError;
use crate::extract::{ExtractionStrategy, PageContext, magnet_from_hash};
use crate::types::{CategoryUrls, Record, UrlTemplate};

/// Provider name.
pub const NAME: &str = "YIFY";
/// Site root.
pub const SITE: &str = "https://yts.am";
/// Largest count the API answers reliably.
pub const MAX_COUNT: usize = 20;

const TRACKERS: [&str; 10] = [
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:80",
    "udp://tracker.coppersurfer.tk:6969",
    "udp://glotorrents.pw:6969/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://torrent.gresille.org:80/announce",
    "udp://p4p.arenabg.com:1337",
    "udp://tracker.leechers-paradise.org:6969",
    "http://track.one:1234/announce",
    "udp://track.two:80",
];

/// Category templates; movies only.
pub fn categories() -> CategoryUrls {
    let search =
        UrlTemplate::new("/api/v2/list_movies.json?query_term={query}&limit=50&page={page}");
    CategoryUrls {
        all: Some(search.clone()),
        movie: Some(search),
        ..Default::default()
    }
}

/// Builds the provider.
pub fn new_provider(fetcher: Arc<dyn Fetcher>) -> PaginatedProvider {
    PaginatedProvider::new(
        NAME,
        SITE,
        categories(),
        PageLayout::uniform(50, 1),
        Box::new(YifyExtractor),
        fetcher,
    )
    .with_max_count(MAX_COUNT)
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    #[serde(default)]
    movies: Option<Vec<Movie>>,
}

#[derive(Debug, Deserialize)]
struct Movie {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    title_long: String,
    #[serde(default)]
    torrents: Option<Vec<MovieTorrent>>,
}

#[derive(Debug, Deserialize)]
struct MovieTorrent {
    #[serde(default)]
    hash: String,
    #[serde(default)]
    quality: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    seeds: u32,
    #[serde(default)]
    peers: u32,
    #[serde(default)]
    size_bytes: u64,
}

/// Extractor for `list_movies.json` responses.
#[derive(Debug)]
pub struct YifyExtractor;

#[async_trait]
impl ExtractionStrategy for YifyExtractor {
    async fn extract(
        &self,
        content: &str,
        page: &PageContext<'_>,
    ) -> Result<Vec<Record>, SearchError> {
        let response: ApiResponse =
            serde_json::from_str(content).map_err(|e| SearchError::Parse {
                provider: page.provider.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("{}: Message -> {}", page.provider, response.status_message);
        if response.status != "ok" {
            return Err(SearchError::Parse {
                provider: page.provider.to_string(),
                reason: format!("API returned status '{}'", response.status),
            });
        }

        let movies = response.data.and_then(|data| data.movies).unwrap_or_default();
        let records = movies
            .iter()
            .flat_map(|movie| {
                movie
                    .torrents
                    .iter()
                    .flatten()
                    .map(move |torrent| movie_record(page.provider, movie, torrent))
            })
            .filter(Record::is_valid)
            .collect();

        Ok(records)
    }
}

fn movie_record(provider: &str, movie: &Movie, torrent: &MovieTorrent) -> Record {
    let mut magnet = magnet_from_hash(&torrent.hash, Some(&movie.title));
    for tracker in TRACKERS {
        magnet.push_str("&tr=");
        magnet.push_str(tracker);
    }

    Record {
        origin: provider.to_string(),
        title: format!(
            "{} {} {} YIFY",
            movie.title_long, torrent.quality, torrent.kind
        ),
        url: movie.url.clone(),
        seeders: torrent.seeds,
        leechers: torrent.peers,
        size: torrent.size_bytes,
        magnet,
    }
}
