//! Trawl Core - shared plumbing for torrent search aggregation
//!
//! This crate provides the pieces every search component leans on: the
//! outbound HTTP fetch client, centralized configuration, and tracing setup.

pub mod config;
pub mod fetch;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{CacheConfig, ConfigError, ConfigFile, NetworkConfig, SearchConfig, TrawlConfig};
pub use fetch::{FetchError, Fetcher, HttpFetcher};

/// Convenience type alias for fetch results.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
