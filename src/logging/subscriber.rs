// tracing-subscriber setup

use crate::config::Config;
use crate::core::errors::HookError;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber from config values.
///
/// `RUST_LOG` wins over `LOG_LEVEL` when set. Must be called at most once per
/// process; a second call reports a configuration error instead of panicking.
pub fn init_tracing(config: &Config) -> Result<(), HookError> {
    let level = parse_log_level(&config.log_level)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = fmt()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    let installed = if config.log_format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    installed.map_err(|e| HookError::Configuration(format!("Failed to install tracing subscriber: {}", e)))
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> Result<tracing::Level, HookError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(HookError::Configuration(format!("Invalid log level: {}", level))),
    }
}
