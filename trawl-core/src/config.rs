//! Centralized configuration for Trawl.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered throughout the search providers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser-like identifying header sent when the caller supplies none.
///
/// Several torrent indexes reject obvious non-browser clients, so the default
/// mirrors a desktop Safari build.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_5) AppleWebKit/603.3.8 (KHTML, like Gecko) Version/10.1.2 Safari/603.3.8";

/// Central configuration for all Trawl components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides and an optional JSON file.
#[derive(Debug, Clone, Default)]
pub struct TrawlConfig {
    pub network: NetworkConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
}

/// Outbound HTTP configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Absolute timeout for a single fetch, connect through body
    pub fetch_timeout: Duration,
    /// User agent applied when a request carries none
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Result budgeting and per-provider pacing.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Default number of results requested when the caller gives none
    pub results_limit: usize,
    /// Hard upper bound on any aggregated request
    pub max_results: usize,
    /// Minimum spacing between requests to a rate-limited provider
    pub rate_limit_interval: Duration,
    /// Attempts per page when a rate-limited provider rejects a request
    pub rate_limit_attempts: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_limit: 100,
            max_results: 500,
            rate_limit_interval: Duration::from_secs(1),
            rate_limit_attempts: 3,
        }
    }
}

/// Location of persisted cross-run state (auth tokens).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding one token file per token-authenticated provider
    pub cache_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("trawl"),
        }
    }
}

impl TrawlConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("TRAWL_FETCH_TIMEOUT")
            && let Ok(seconds) = timeout.parse::<u64>()
        {
            config.network.fetch_timeout = Duration::from_secs(seconds);
        }

        if let Ok(limit) = std::env::var("TRAWL_RESULTS_LIMIT")
            && let Ok(count) = limit.parse::<usize>()
        {
            config.search.results_limit = count;
        }

        if let Ok(dir) = std::env::var("TRAWL_CACHE_DIR")
            && !dir.is_empty()
        {
            config.cache.cache_dir = PathBuf::from(dir);
        }

        config
    }

    /// Overlays values from a configuration file onto this configuration.
    pub fn apply_file(&mut self, file: &ConfigFile) {
        self.search.results_limit = file.results_limit;
        if let Some(dir) = &file.cache_dir {
            self.cache.cache_dir = dir.clone();
        }
    }

    /// Creates a configuration for tests: short timeouts, no pacing, and a
    /// cache directory under the given root.
    pub fn for_testing(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            network: NetworkConfig {
                fetch_timeout: Duration::from_secs(5),
                ..Default::default()
            },
            search: SearchConfig {
                rate_limit_interval: Duration::from_millis(1),
                ..Default::default()
            },
            cache: CacheConfig {
                cache_dir: cache_dir.into(),
            },
        }
    }
}

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// User-editable settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub results_limit: usize,
    pub cache_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            results_limit: SearchConfig::default().results_limit,
            cache_dir: None,
            debug: false,
        }
    }
}

impl ConfigFile {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("trawl")
            .join("config.json")
    }

    /// Writes a configuration file holding the default values.
    ///
    /// # Errors
    /// - `ConfigError::Io` - Parent directory or file could not be written
    /// - `ConfigError::Parse` - Defaults could not be serialized
    pub fn init(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::default();
        let data = serde_json::to_string_pretty(&config).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, data).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    /// Reads the configuration file at `path`.
    ///
    /// # Errors
    /// - `ConfigError::Io` - File missing or unreadable
    /// - `ConfigError::Parse` - File contents are not valid JSON
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
