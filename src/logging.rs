//! Diagnostics setup for the `aq` binary.
//!
//! The library only emits `tracing` events. Stage progress and per-column
//! work log at `info`, inference and sampling details at `debug`, all-null
//! columns at `warn`.

use tracing::Level;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub with_timestamps: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_timestamps: true,
            with_ansi: atty::is(atty::Stream::Stderr),
        }
    }
}

impl LogConfig {
    /// `-v` selects debug, `-t` warn, neither info.
    #[must_use]
    pub fn from_flags(verbose: bool, terse: bool) -> Self {
        let level = if verbose {
            Level::DEBUG
        } else if terse {
            Level::WARN
        } else {
            Level::INFO
        };
        Self {
            level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.with_timestamps = enable;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber, writing to stderr.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(build_env_filter(config.level));

    if config.with_timestamps {
        registry.with(layer).try_init()
    } else {
        registry.with(layer.without_time()).try_init()
    }
}

/// `RUST_LOG` wins; otherwise our crate logs at `level` and dependencies at warn.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("warn,analyze_quality={level},aq={level}")
}
