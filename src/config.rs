// Configuration management

use crate::core::errors::HookError;
use crate::logging::{ContextLogger, Logger};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::sync::Arc;

/// Interceptor configuration
///
/// The connection settings are handed to the `redis` crate as-is. The logger
/// fields cannot come from the environment and are set in code.
#[derive(Clone)]
pub struct Config {
    // Redis connection
    pub redis_url: String,
    pub redis_connection_timeout_secs: u64,
    pub redis_connection_retries: u32,

    // Interception
    pub debug: bool,
    pub disabled_commands: HashSet<String>,

    // Logging configuration
    pub log_level: String,
    pub log_format: String, // "json" or "text"

    /// Logger wired before the connectivity probe; `TracingLogger` when unset
    pub logger: Option<Arc<dyn Logger>>,

    /// Per-call logger selection; the handle's active logger when unset
    pub context_logger: Option<ContextLogger>,
}

impl Config {
    /// Configuration for `redis_url` with every other field at its default
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            redis_connection_timeout_secs: 5,
            redis_connection_retries: 3,
            debug: false,
            disabled_commands: HashSet::new(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            logger: None,
            context_logger: None,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Supports `.env` file loading in development (via dotenv crate).
    pub fn from_env() -> Result<Self, HookError> {
        #[cfg(not(test))]
        {
            dotenv::dotenv().ok();
        }

        let config = Self {
            redis_url: Self::get_env_or_default("REDIS_URL", "redis://127.0.0.1:6379/0"),
            redis_connection_timeout_secs: Self::parse_u64_or_default("REDIS_CONNECTION_TIMEOUT_SECS", 5)?,
            redis_connection_retries: Self::parse_u32_or_default("REDIS_CONNECTION_RETRIES", 3)?,
            debug: Self::parse_bool_or_default("REDIS_DEBUG", false)?,
            disabled_commands: Self::parse_list("REDIS_DISABLED_COMMANDS"),
            log_level: Self::get_env_or_default("LOG_LEVEL", "info"),
            log_format: Self::get_env_or_default("LOG_FORMAT", "text"),
            logger: None,
            context_logger: None,
        };

        config.validate()?;

        Ok(config)
    }

    /// Builder-style setter for the initial logger
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builder-style setter for the per-call logger selection
    pub fn with_context_logger(mut self, context_logger: ContextLogger) -> Self {
        self.context_logger = Some(context_logger);
        self
    }

    /// Builder-style setter adding disabled commands
    pub fn with_disabled_commands<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_commands.extend(names.into_iter().map(Into::into));
        self
    }

    fn get_env_or_default(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    fn parse_u64_or_default(key: &str, default: u64) -> Result<u64, HookError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.trim().parse::<u64>().map_err(|e| {
                    HookError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == 0 {
                    return Err(HookError::Configuration(format!("{} must be greater than 0", key)));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_u32_or_default(key: &str, default: u32) -> Result<u32, HookError> {
        match env::var(key) {
            Ok(value) => {
                let parsed = value.trim().parse::<u32>().map_err(|e| {
                    HookError::Configuration(format!("Invalid {} value '{}': {}", key, value, e))
                })?;

                if parsed == 0 {
                    return Err(HookError::Configuration(format!("{} must be greater than 0", key)));
                }

                Ok(parsed)
            }
            _ => Ok(default),
        }
    }

    fn parse_bool_or_default(key: &str, default: bool) -> Result<bool, HookError> {
        match env::var(key) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(HookError::Configuration(format!(
                    "Invalid {} value '{}': expected true or false",
                    key, value
                ))),
            },
            _ => Ok(default),
        }
    }

    /// Comma-separated list, blanks dropped
    fn parse_list(key: &str) -> HashSet<String> {
        env::var(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), HookError> {
        Self::validate_url(&self.redis_url)?;

        if self.redis_connection_timeout_secs == 0 {
            return Err(HookError::Configuration(
                "REDIS_CONNECTION_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Self::validate_log_level(&self.log_level)?;
        Self::validate_log_format(&self.log_format)?;

        Ok(())
    }

    fn validate_url(url: &str) -> Result<(), HookError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| HookError::Configuration(format!("Invalid Redis URL '{}': {}", url, e)))?;

        match parsed.scheme() {
            "redis" | "rediss" | "redis+unix" | "unix" => Ok(()),
            other => Err(HookError::Configuration(format!(
                "Invalid Redis URL '{}': unsupported scheme '{}'",
                url, other
            ))),
        }
    }

    fn validate_log_level(level: &str) -> Result<(), HookError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.to_lowercase().as_str()) {
            return Err(HookError::Configuration(format!(
                "Invalid LOG_LEVEL '{}': must be one of {}",
                level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_log_format(format: &str) -> Result<(), HookError> {
        if format != "json" && format != "text" {
            return Err(HookError::Configuration(format!(
                "Invalid LOG_FORMAT '{}': must be 'json' or 'text'",
                format
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Create a test configuration for unit tests
    ///
    /// This bypasses environment variable loading.
    pub fn test_config() -> Self {
        Self::new("redis://127.0.0.1:6379/0")
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &self.redis_url)
            .field("redis_connection_timeout_secs", &self.redis_connection_timeout_secs)
            .field("redis_connection_retries", &self.redis_connection_retries)
            .field("debug", &self.debug)
            .field("disabled_commands", &self.disabled_commands)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("logger", &self.logger.is_some())
            .field("context_logger", &self.context_logger.is_some())
            .finish()
    }
}
