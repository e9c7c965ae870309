//! Provider registry.
//!
//! Providers are constructed once at startup and shared by reference for the
//! rest of the run. Names are unique, compared case-insensitively.

use std::sync::Arc;

use trawl_core::{Fetcher, TrawlConfig};

use crate::errors::SearchError;
use crate::providers::{
    RarbgProvider, TorrentProvider, leetx, limetorrents, sukebei, thepiratebay, torrentz, yify,
};

/// Ordered set of providers available for selection.
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn TorrentProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in provider.
    pub fn with_defaults(fetcher: Arc<dyn Fetcher>, config: &TrawlConfig) -> Self {
        let providers: Vec<Arc<dyn TorrentProvider>> = vec![
            Arc::new(thepiratebay::new_provider(fetcher.clone())),
            Arc::new(limetorrents::new_provider(fetcher.clone())),
            Arc::new(torrentz::new_provider(fetcher.clone())),
            Arc::new(RarbgProvider::new(fetcher.clone(), &config.cache.cache_dir)),
            Arc::new(leetx::new_provider(fetcher.clone(), &config.search)),
            Arc::new(yify::new_provider(fetcher.clone())),
            Arc::new(sukebei::new_provider(fetcher)),
        ];

        Self { providers }
    }

    /// Adds a provider after the existing ones.
    ///
    /// # Errors
    /// - `SearchError::DuplicateProvider` - A provider with the same name exists
    pub fn register(&mut self, provider: Arc<dyn TorrentProvider>) -> Result<(), SearchError> {
        if self.get(provider.name()).is_some() {
            return Err(SearchError::DuplicateProvider {
                name: provider.name().to_string(),
            });
        }

        tracing::debug!("Registered provider {}", provider.name());
        self.providers.push(provider);
        Ok(())
    }

    /// Looks a provider up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TorrentProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.name().eq_ignore_ascii_case(name.trim()))
    }

    /// All providers in registration order.
    pub fn providers(&self) -> &[Arc<dyn TorrentProvider>] {
        &self.providers
    }

    /// Provider names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Checks if no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
