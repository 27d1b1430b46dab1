//! Startup error types for fedwatch.
//!
//! Every variant here is fatal: the process reports it and exits before the
//! sweep loop starts.

/// Configuration and identifier errors raised while starting up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid user ID '{value}': {reason}")]
    InvalidUserId { value: String, reason: String },

    #[error("Invalid room ID '{value}': {reason}")]
    InvalidRoomId { value: String, reason: String },

    #[error("Invalid setting '{key}': {message}")]
    InvalidSetting { key: &'static str, message: String },
}

/// Convenience type alias for Results using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
