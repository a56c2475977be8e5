//! Structured logging setup.
//!
//! Events are written to stderr so that the CLI can keep stdout for rendered
//! responses. Configure with:
//!
//! - `SIMPLEROUTER_LOG_LEVEL` - `trace`, `debug`, `info` (default), `warn`, `error`
//! - `SIMPLEROUTER_LOG_FORMAT` - `json` (default) or `pretty`
//! - `SIMPLEROUTER_LOG_TARGET_FILTER` - extra comma-separated filter directives,
//!   e.g. `simplerouter::router=debug`
//! - `SIMPLEROUTER_LOG_INCLUDE_LOCATION` - `true` to add file and line
//!
//! `RUST_LOG`, when set, takes precedence over the level.

use std::env;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Unknown names fall back to JSON.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("pretty") {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Subscriber settings read from `SIMPLEROUTER_LOG_*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub directives: Vec<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Json,
            directives: Vec::new(),
            include_location: false,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok();
        Self {
            level: var("SIMPLEROUTER_LOG_LEVEL").map_or(Level::INFO, |s| parse_level(&s)),
            format: var("SIMPLEROUTER_LOG_FORMAT").map_or_else(LogFormat::default, |s| LogFormat::parse(&s)),
            directives: var("SIMPLEROUTER_LOG_TARGET_FILTER")
                .map(|s| split_directives(&s))
                .unwrap_or_default(),
            include_location: var("SIMPLEROUTER_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
        }
    }

    fn filter(&self) -> EnvFilter {
        let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));
        self.directives.iter().fold(base, |filter, raw| match raw.parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => {
                eprintln!("Warning: Invalid log filter directive: {raw}");
                filter
            }
        })
    }
}

fn parse_level(s: &str) -> Level {
    s.trim().parse().unwrap_or(Level::INFO)
}

fn split_directives(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let location = config.include_location;
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(location)
        .with_line_number(location);
    let layer = match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(layer)
        .try_init()
        .context("Failed to initialize logging")
}
