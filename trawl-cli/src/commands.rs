//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use trawl_core::tracing_setup::CliLogLevel;
use trawl_core::{ConfigFile, HttpFetcher, TrawlConfig};
use trawl_search::{Aggregator, ProviderRegistry, ProviderSelector, Record, SearchRequest};

const TITLE_WIDTH: usize = 60;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search the selected providers and print the merged results
    Search {
        /// Search text
        query: String,
        /// Number of results wanted (defaults to the configured limit)
        #[arg(short, long)]
        count: Option<usize>,
        /// Category: all, movie, tv, anime or adult
        #[arg(long, default_value = "all")]
        category: String,
        /// Sort key: default, seeders, leechers or size
        #[arg(short, long, default_value = "default")]
        sort: String,
        /// Provider to query, repeatable (defaults to every provider)
        #[arg(short, long = "provider")]
        providers: Vec<String>,
        /// Print the magnet link under each row
        #[arg(short, long)]
        magnets: bool,
    },
    /// List registered providers
    Providers,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration file actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a configuration file holding the defaults
    Init {
        /// Where to write the file (defaults to the user config directory)
        path: Option<PathBuf>,
    },
}

/// Builds the runtime configuration from the environment and the optional
/// configuration file, returning the file alongside when one was read.
///
/// An explicit `path` must exist; the default location is only read when
/// present.
///
/// # Errors
/// Returns an error if the configuration file cannot be read or parsed
pub fn load_config(path: Option<&Path>) -> Result<(TrawlConfig, Option<ConfigFile>)> {
    let mut config = TrawlConfig::from_env();

    let file = match path {
        Some(path) => Some(ConfigFile::load(path)?),
        None => {
            let default_path = ConfigFile::default_path();
            if default_path.exists() {
                Some(ConfigFile::load(&default_path)?)
            } else {
                None
            }
        }
    };

    if let Some(file) = &file {
        config.apply_file(file);
    }

    Ok((config, file))
}

/// Console level for the run; `debug` in the config file only ever raises it.
pub fn console_level(requested: CliLogLevel, file: Option<&ConfigFile>) -> CliLogLevel {
    match file {
        Some(file) if file.debug => requested.raised_to(CliLogLevel::Debug),
        _ => requested,
    }
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands, config: TrawlConfig) -> Result<()> {
    match command {
        Commands::Search {
            query,
            count,
            category,
            sort,
            providers,
            magnets,
        } => {
            let count = count.unwrap_or(config.search.results_limit);
            let request = SearchRequest::parse(query, count, &category, &sort)?;
            search(&config, request, providers, magnets).await
        }
        Commands::Providers => list_providers(&config),
        Commands::Config {
            action: ConfigAction::Init { path },
        } => init_config(path),
    }
}

fn build_registry(config: &TrawlConfig) -> Result<ProviderRegistry> {
    let fetcher = HttpFetcher::new(&config.network).context("Failed to build HTTP client")?;
    Ok(ProviderRegistry::with_defaults(Arc::new(fetcher), config))
}

/// Run a search and print the results table
///
/// # Errors
/// Returns an error if the HTTP client cannot be built
async fn search(
    config: &TrawlConfig,
    request: SearchRequest,
    providers: Vec<String>,
    magnets: bool,
) -> Result<()> {
    let registry = build_registry(config)?;
    let selectors: Vec<ProviderSelector> = providers.into_iter().map(Into::into).collect();

    tracing::info!(
        "Searching '{}' for {} results ({}, sorted by {})",
        request.query,
        request.count,
        request.category,
        request.sort
    );

    let results = Aggregator::new(&registry)
        .with_max_results(config.search.max_results)
        .list_results(&selectors, &request)
        .await;

    if results.is_empty() {
        println!("No results found for '{}'", request.query);
        return Ok(());
    }

    print_table(&results, magnets);
    Ok(())
}

fn print_table(results: &[Record], magnets: bool) {
    let index_width = results.len().to_string().len();

    println!(
        "{:>index_width$}  {:<TITLE_WIDTH$}  {:>6}  {:>6}  {:>10}  origin",
        "#", "name", "S", "L", "size"
    );
    for (index, record) in results.iter().enumerate() {
        println!(
            "{:>index_width$}  {:<TITLE_WIDTH$}  {:>6}  {:>6}  {:>10}  {}",
            index + 1,
            truncate_title(&record.title),
            record.seeders,
            record.leechers,
            record.format_size(),
            record.origin
        );
        if magnets {
            println!("{:>index_width$}  {}", "", record.magnet);
        }
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        return title.to_string();
    }
    let mut short: String = title.chars().take(TITLE_WIDTH - 3).collect();
    short.push_str("...");
    short
}

/// Print every registered provider with its supported categories
///
/// # Errors
/// Returns an error if the HTTP client cannot be built
fn list_providers(config: &TrawlConfig) -> Result<()> {
    let registry = build_registry(config)?;

    for provider in registry.providers() {
        let categories: Vec<String> = provider
            .categories()
            .supported()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{:<14} {:<32} {}",
            provider.name(),
            provider.site(),
            categories.join(", ")
        );
    }

    Ok(())
}

/// Write the default configuration file
///
/// # Errors
/// Returns an error if the file exists or cannot be written
fn init_config(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(ConfigFile::default_path);
    if path.exists() {
        bail!("Config file {} already exists", path.display());
    }

    ConfigFile::init(&path)?;
    println!("Wrote default configuration to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("Ubuntu"), "Ubuntu");

        let long = "x".repeat(TITLE_WIDTH + 10);
        let short = truncate_title(&long);
        assert_eq!(short.chars().count(), TITLE_WIDTH);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_config_file_overlays_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"results_limit": 7, "cache_dir": "/tmp/trawl-cli-test"}"#)
            .unwrap();

        let (config, file) = load_config(Some(&path)).unwrap();

        assert!(!file.unwrap().debug);
        assert_eq!(config.search.results_limit, 7);
        assert_eq!(config.cache.cache_dir, PathBuf::from("/tmp/trawl-cli-test"));
    }

    #[test]
    fn test_config_debug_only_raises_console_level() {
        let debug = ConfigFile {
            debug: true,
            ..ConfigFile::default()
        };

        assert_eq!(console_level(CliLogLevel::Warn, Some(&debug)), CliLogLevel::Debug);
        assert_eq!(console_level(CliLogLevel::Trace, Some(&debug)), CliLogLevel::Trace);
        assert_eq!(
            console_level(CliLogLevel::Info, Some(&ConfigFile::default())),
            CliLogLevel::Info
        );
        assert_eq!(console_level(CliLogLevel::Error, None), CliLogLevel::Error);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        init_config(Some(path.clone())).unwrap();
        assert!(init_config(Some(path)).is_err());
    }
}
