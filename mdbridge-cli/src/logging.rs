//! Logging setup for the `mdbridge` binary.
//!
//! The library crates only emit `tracing` events; this module installs the
//! subscriber that prints them. Output always goes to stderr so converted
//! documents on stdout stay clean.
//!
//! # Log Levels
//!
//! - `warn`: degraded output, such as node types with no serializer (default)
//! - `debug`: conversion steps, import transforms (`-v`)
//! - `trace`: everything, including debounce bookkeeping (`-vv`)
//!
//! `RUST_LOG` takes precedence over the `-v` flags when it is set.

use std::io;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events follow the `-v` level. Everything else stays at `warn`.
const OWN_CRATES: &[&str] = &["mdbridge", "mdbridge_babel", "mdbridge_config"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub with_ansi: bool,
}

impl LogConfig {
    /// Map the number of `-v` flags to a level.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            with_ansi: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_verbosity(0)
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    // try_init fails only when a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init();
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(OWN_CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}
