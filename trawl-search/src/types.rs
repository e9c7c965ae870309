//! Data types for torrent search: records, categories, sort keys and URL templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SearchError;

/// One normalized torrent listing.
///
/// A record is only ever surfaced when `is_valid` holds; extraction drops
/// anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Name of the provider the listing came from
    pub origin: String,
    /// Listing title as shown by the provider
    pub title: String,
    /// Absolute URL of the provider's detail page
    pub url: String,
    /// Seeder count
    pub seeders: u32,
    /// Leecher count
    pub leechers: u32,
    /// Total size in bytes, zero when unknown
    pub size: u64,
    /// Magnet URI, empty when the provider could not supply one
    pub magnet: String,
}

impl Record {
    /// Checks the listing invariant: seeded, titled and linked.
    pub fn is_valid(&self) -> bool {
        self.seeders > 0 && !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }

    /// Format file size in human-readable format.
    pub fn format_size(&self) -> String {
        const GIB: u64 = 1024 * 1024 * 1024;
        const MIB: u64 = 1024 * 1024;

        if self.size >= GIB {
            format!("{:.1} GiB", self.size as f64 / GIB as f64)
        } else if self.size >= MIB {
            format!("{:.1} MiB", self.size as f64 / MIB as f64)
        } else {
            format!("{:.1} KiB", self.size as f64 / 1024.0)
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] S:{} L:{} {}",
            self.title,
            self.origin,
            self.seeders,
            self.leechers,
            self.format_size()
        )
    }
}

/// Abstract content classification, mapped per provider to a URL template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    /// Everything the provider indexes
    #[default]
    All,
    /// Feature films
    Movie,
    /// Television
    Tv,
    /// Anime
    Anime,
    /// Adult content
    Adult,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 5] = [
        Category::All,
        Category::Movie,
        Category::Tv,
        Category::Anime,
        Category::Adult,
    ];
}

impl FromStr for Category {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Category::All),
            "movie" | "movies" => Ok(Category::Movie),
            "tv" => Ok(Category::Tv),
            "anime" => Ok(Category::Anime),
            "adult" | "porn" | "xxx" => Ok(Category::Adult),
            _ => Err(SearchError::Configuration {
                reason: format!("Invalid category: {s}"),
            }),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => write!(f, "all"),
            Category::Movie => write!(f, "movie"),
            Category::Tv => write!(f, "tv"),
            Category::Anime => write!(f, "anime"),
            Category::Adult => write!(f, "adult"),
        }
    }
}

/// Ordering applied to the merged result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Keep provider-concatenation order
    #[default]
    Default,
    /// Most seeders first
    Seeders,
    /// Most leechers first
    Leechers,
    /// Largest first
    Size,
}

impl FromStr for SortKey {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(SortKey::Default),
            "seeders" => Ok(SortKey::Seeders),
            "leechers" => Ok(SortKey::Leechers),
            "size" => Ok(SortKey::Size),
            _ => Err(SearchError::Configuration {
                reason: format!("Invalid sort key: {s}"),
            }),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Default => write!(f, "default"),
            SortKey::Seeders => write!(f, "seeders"),
            SortKey::Leechers => write!(f, "leechers"),
            SortKey::Size => write!(f, "size"),
        }
    }
}

/// Sorts records in place, descending on the chosen field.
///
/// The sort is stable, so ties keep their concatenation order and
/// `SortKey::Default` leaves the slice untouched.
pub fn sort_records(records: &mut [Record], key: SortKey) {
    match key {
        SortKey::Default => {}
        SortKey::Seeders => records.sort_by(|a, b| b.seeders.cmp(&a.seeders)),
        SortKey::Leechers => records.sort_by(|a, b| b.leechers.cmp(&a.leechers)),
        SortKey::Size => records.sort_by(|a, b| b.size.cmp(&a.size)),
    }
}

/// Provider URL path with `{query}`, `{page}` and `{limit}` placeholders.
///
/// Templates are relative to the provider's site and expect the query to be
/// URL-encoded before substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Creates a template from its raw pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Raw pattern text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expands the template for one results page.
    pub fn render(&self, encoded_query: &str, page: u32) -> String {
        self.0
            .replace("{query}", encoded_query)
            .replace("{page}", &page.to_string())
    }

    /// Expands the template for a single request with a result limit.
    pub fn render_with_limit(&self, encoded_query: &str, limit: usize) -> String {
        self.0
            .replace("{query}", encoded_query)
            .replace("{limit}", &limit.to_string())
    }
}

/// Per-category URL templates of one provider; absent entries are unsupported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUrls {
    /// Template for all content
    pub all: Option<UrlTemplate>,
    /// Template for movies
    pub movie: Option<UrlTemplate>,
    /// Template for television
    pub tv: Option<UrlTemplate>,
    /// Template for anime
    pub anime: Option<UrlTemplate>,
    /// Template for adult content
    pub adult: Option<UrlTemplate>,
}

impl CategoryUrls {
    /// Resolves a category to its template, `None` when unsupported.
    pub fn get(&self, category: Category) -> Option<&UrlTemplate> {
        match category {
            Category::All => self.all.as_ref(),
            Category::Movie => self.movie.as_ref(),
            Category::Tv => self.tv.as_ref(),
            Category::Anime => self.anime.as_ref(),
            Category::Adult => self.adult.as_ref(),
        }
    }

    /// Resolves a category, falling back to the All template.
    pub fn get_or_all(&self, category: Category) -> Option<&UrlTemplate> {
        self.get(category).or(self.all.as_ref())
    }

    /// Categories with a template, in display order.
    pub fn supported(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| self.get(*category).is_some())
            .collect()
    }
}
