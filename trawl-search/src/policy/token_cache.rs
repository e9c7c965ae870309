//! File-backed auth token persistence.
//!
//! One plain-text file per token-authenticated provider holds the raw token
//! with no envelope. Any non-empty content counts as a token until a search
//! proves it stale. There is no inter-process locking.

use std::path::{Path, PathBuf};

use crate::errors::SearchError;

/// Persisted token of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Creates a cache backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file for `provider` under `cache_dir`, e.g. `rarbg_token.txt`.
    pub fn for_provider(cache_dir: &Path, provider: &str) -> Self {
        Self::new(cache_dir.join(format!("{}_token.txt", provider.to_lowercase())))
    }

    /// Location of the token file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted token; `None` when missing, unreadable or blank.
    pub fn load(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    /// Persists `token`, creating the cache directory if needed.
    ///
    /// # Errors
    /// - `SearchError::TokenCache` - Directory or file could not be written
    pub fn store(&self, token: &str) -> Result<(), SearchError> {
        let to_error = |source| SearchError::TokenCache {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
        std::fs::write(&self.path, token).map_err(to_error)
    }
}
