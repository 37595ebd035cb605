// Domain error types for the command interceptor

use thiserror::Error;

/// Main error type for the interceptor
#[derive(Error, Debug)]
pub enum HookError {
    /// Command rejected by the disabled-command filter before execution
    #[error("Command not allowed: {command}")]
    CommandDisabled { command: String },

    /// Command failed inside the Redis client or on the server
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Key does not exist (nil reply for a non-optional result type)
    #[error("redis: nil")]
    Nil,

    /// Client construction, connection or connectivity probe failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HookError {
    /// True for the key-not-found sentinel
    pub fn is_nil(&self) -> bool {
        matches!(self, HookError::Nil)
    }

    /// True when the filter rejected the command
    pub fn is_disabled(&self) -> bool {
        matches!(self, HookError::CommandDisabled { .. })
    }
}

/// Map the nil sentinel to "no error", leaving every other error untouched.
pub fn normalize_nil_error(err: Option<HookError>) -> Option<HookError> {
    match err {
        Some(HookError::Nil) | None => None,
        other => other,
    }
}
