//! Logging setup for the binary.
//!
//! Library code logs through the `log` macros and opens `tracing` spans
//! around requests. [`init_logging`] installs a `tracing-subscriber`
//! registry as the global default and bridges `log` records into it with
//! `tracing_log::LogTracer`, so both end up in the same stream on stderr.
//! Each step can succeed only once per process.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

/// Third-party crates that are too chatty at `info`/`debug`.
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("reqwest", "warn"),
    ("rustls", "warn"),
    ("h2", "warn"),
];

/// Builds the filter from the base level plus the noisy-crate overrides.
fn build_env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    let mut directives = vec![level.to_string()];
    for (target, lvl) in NOISY_TARGETS {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| ConfigError::Logging(format!("Invalid filter '{}': {}", filter_str, e)))
}

/// Installs the global subscriber. `RUST_LOG`, when set, replaces the
/// configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => EnvFilter::try_new(&value)
            .map_err(|e| ConfigError::Logging(format!("Invalid RUST_LOG '{}': {}", value, e)))?,
        _ => build_env_filter(&config.level)?,
    };

    let layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
    };

    tracing_log::LogTracer::init().map_err(|e| ConfigError::Logging(e.to_string()))?;
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layer))
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::trace!("Logging initialized: level={}, format={:?}", config.level, config.format);
    Ok(())
}
