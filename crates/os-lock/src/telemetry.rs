//! Structured logging setup.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init_tracing`] once.

use std::env;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `os_lock=debug`.
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LogConfig {
    /// Load from `OS_LOCK_LOG_LEVEL` (falling back to `RUST_LOG`) and
    /// `OS_LOCK_JSON_LOGS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("OS_LOCK_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: env::var("OS_LOCK_JSON_LOGS")
                .map(|v| crate::domain::config::parse_flag(&v))
                .unwrap_or(defaults.json_logs),
        }
    }
}

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive did not parse, or a global subscriber is already set.
    #[error("tracing init failed: {0}")]
    Init(String),
}

/// Install a global `tracing` subscriber.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Init(e.to_string()))?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?;
    }

    tracing::debug!(
        level = %config.log_level,
        json = config.json_logs,
        "[os-lock] Tracing initialized"
    );
    Ok(())
}
