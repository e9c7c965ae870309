//! Error types for torrent search.

use std::path::PathBuf;

use thiserror::Error;
use trawl_core::FetchError;

/// Errors that can occur during search operations.
///
/// Only `Configuration` aborts an aggregated search; every other kind is
/// absorbed at the page or provider level and shows up as fewer results.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Fetching a page, detail page or auth endpoint failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A successful response carried nothing, which the provider reads as a
    /// stale auth token.
    #[error("Provider '{provider}' returned an empty payload")]
    EmptyPayload {
        /// Provider that returned the empty payload
        provider: String,
    },

    /// A fresh auth token could not be obtained.
    #[error("Provider '{provider}' authentication failed: {reason}")]
    Authentication {
        /// Provider whose auth endpoint failed
        provider: String,
        /// The reason for the failure
        reason: String,
    },

    /// Response content could not be interpreted.
    #[error("Provider '{provider}' returned unparseable content: {reason}")]
    Parse {
        /// Provider whose response was malformed
        provider: String,
        /// The reason for the parse error
        reason: String,
    },

    /// Provider has neither the requested category nor an All template.
    #[error("Provider '{provider}' has no usable URL template")]
    MissingTemplate {
        /// Provider lacking templates
        provider: String,
    },

    /// Invalid category or sort key supplied by the caller.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// The reason for the configuration fault
        reason: String,
    },

    /// The persisted token file could not be written.
    #[error("Token cache {path} could not be written: {source}")]
    TokenCache {
        /// Location of the token file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Two providers were registered under the same name.
    #[error("Provider '{name}' is already registered")]
    DuplicateProvider {
        /// The conflicting provider name
        name: String,
    },
}

impl SearchError {
    /// Checks if this error must abort the whole search instead of degrading.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(self, SearchError::Configuration { .. })
    }
}
