//! Trawl Search - concurrent torrent search aggregation
//!
//! Queries many heterogeneous torrent indexes (scraped HTML sites and JSON
//! APIs) concurrently and merges their listings into one ranked result set.
//! Each provider plugs an extraction strategy into a shared paginated query
//! engine; the aggregator fans out across providers, absorbs their failures,
//! then sorts and truncates the merged list.

#![warn(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]

pub mod aggregator;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod policy;
pub mod providers;
pub mod registry;
pub mod size;
pub mod types;

// Re-export main types
pub use aggregator::{Aggregator, MAX_RESULTS, ProviderSelector, SearchRequest};
pub use engine::{PagePlan, QueryEngine, compute_page_count};
pub use errors::SearchError;
pub use extract::{ExtractionStrategy, PageContext};
pub use providers::{PageLayout, PaginatedProvider, TorrentProvider};
pub use registry::ProviderRegistry;
pub use types::{Category, CategoryUrls, Record, SortKey, UrlTemplate, sort_records};

/// Convenience type alias for Results with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
