//! Logging for Trawl runs
//!
//! The console shows what the user asked for. Every run also rewrites
//! `trawl-last-run.log` under the cache directory with the full trace, so a
//! search that came back short can be diagnosed after the fact.

use std::fs::{File, create_dir_all};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::CacheConfig;

/// Name of the per-run trace file, overwritten on every run.
pub const LOG_FILE_NAME: &str = "trawl-last-run.log";

/// Dependencies whose own tracing would bury the provider logs.
const QUIET_TARGETS: [(&str, &str); 4] = [
    ("html5ever", "info"),
    ("selectors", "info"),
    ("hyper_util", "info"),
    ("reqwest", "debug"),
];

/// Where the trace file of a run lives.
pub fn logs_dir(cache: &CacheConfig) -> PathBuf {
    cache.cache_dir.join("logs")
}

/// Filter directives for `base` with the noisy dependencies capped.
fn directives(base: &str) -> String {
    QUIET_TARGETS
        .iter()
        .fold(base.to_string(), |mut directives, (target, level)| {
            directives.push_str(&format!(",{target}={level}"));
            directives
        })
}

fn console_filter(level: CliLogLevel) -> EnvFilter {
    // RUST_LOG wins over the CLI flag when set
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(&level.to_string())))
}

/// Installs the console and trace-file subscribers and returns the trace file path.
///
/// # Errors
/// - `std::io::Error` - The logs directory or trace file could not be created,
///   or a global subscriber is already installed
pub fn init_tracing(console_level: CliLogLevel, logs_dir: &Path) -> io::Result<PathBuf> {
    create_dir_all(logs_dir)?;
    let trace_path = logs_dir.join(LOG_FILE_NAME);
    let trace_file = Arc::new(File::create(&trace_path)?);

    let console = fmt::layer()
        .compact()
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(console_filter(console_level));

    let trace = fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(trace_file)
        .with_filter(EnvFilter::new(directives("trace")));

    tracing_subscriber::registry()
        .with(console)
        .with(trace)
        .try_init()
        .map_err(io::Error::other)?;

    tracing::debug!(
        "Logging to console at {}, full trace in {}",
        console_level,
        trace_path.display()
    );
    Ok(trace_path)
}

/// Console verbosity chosen on the command line, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only failures that lost results
    Error,
    /// Degradations such as category fallback or empty providers
    #[default]
    Warn,
    /// Provider and page progress
    Info,
    /// Request URLs and per-page counts
    Debug,
    /// Everything
    Trace,
}

impl CliLogLevel {
    /// Raises the level to at least `floor`, never lowering it.
    ///
    /// ```
    /// use trawl_core::tracing_setup::CliLogLevel;
    ///
    /// assert_eq!(CliLogLevel::Warn.raised_to(CliLogLevel::Debug), CliLogLevel::Debug);
    /// assert_eq!(CliLogLevel::Trace.raised_to(CliLogLevel::Debug), CliLogLevel::Trace);
    /// ```
    pub fn raised_to(self, floor: CliLogLevel) -> Self {
        self.max(floor)
    }
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CliLogLevel::Error => "error",
            CliLogLevel::Warn => "warn",
            CliLogLevel::Info => "info",
            CliLogLevel::Debug => "debug",
            CliLogLevel::Trace => "trace",
        })
    }
}
