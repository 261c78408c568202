//! Logging setup for the `arbor` binary.
//!
//! Everything goes to stderr so that stdout only carries the sentence.
//! `RUST_LOG` overrides the level chosen with `-v`.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub with_ansi: bool,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: true,
            with_target: false,
        }
    }
}

impl LogConfig {
    /// - 0 (no `-v`): info
    /// - 1 (`-v`): debug, including the core's diagnostics
    /// - 2+ (`-vv`): trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            with_target: verbosity > 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Installs the global subscriber. Fails if one is already set.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init()?;
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // other crates stay at warn
        EnvFilter::new(format!(
            "warn,arbor={level},arbor_state={level}",
            level = level
        ))
    })
}
