#![forbid(unsafe_code)]

//! Structured logging setup.
//!
//! Library code only emits `tracing` events under `scrolltrial.*` targets;
//! binaries call [`init_logging`] once at startup to install a subscriber.
//!
//! # Targets
//!
//! - `scrolltrial.controller`: job start/stop/failure, per-tick trace
//! - `scrolltrial.trial`: trial setup, target reached, trial finished
//! - `scrolltrial.config`: configuration loading
//! - `scrolltrial.geometry`, `scrolltrial.session`, `scrolltrial.target`:
//!   trace-level detail from the core
//!
//! # Environment override
//!
//! `SCROLLTRIAL_LOG` takes precedence over the configured level, e.g.
//! `SCROLLTRIAL_LOG=scrolltrial.controller=trace,info`.

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that overrides [`LogConfig::level`].
pub const LOG_ENV: &str = "SCROLLTRIAL_LOG";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration (`[log]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive (`info`, `scrolltrial.trial=debug`, ...).
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Error type for logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log filter {directive:?}: {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("failed to install global subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter: `SCROLLTRIAL_LOG` if set and valid, else `config.level`.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| LogError::InvalidFilter {
        directive: config.level.clone(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber, writing to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()?,
    }
    Ok(())
}
