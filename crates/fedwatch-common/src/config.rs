//! Application configuration loaded from a config file and environment variables.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > config file > defaults
//!
//! The loaded [`AppConfig`] is immutable. Callers wrap it in an `Arc` and hand it
//! to each component at construction time.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::validation::{validate_room_id, validate_user_id};

/// Default number of seconds between two sweeps.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Load the configuration.
///
/// When `path` is `None`, an optional `config.{yaml,toml,json}` in the working
/// directory is used. An explicit path must exist.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let cfg = with_defaults()?
        .add_source(file)
        // Environment variables (FEDWATCH__MATRIX__PASSWORD, FEDWATCH__MONITOR__INTERVAL_SECS, etc.)
        .add_source(
            config::Environment::with_prefix("FEDWATCH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(cfg)
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("monitor.interval_secs", DEFAULT_INTERVAL_SECS as i64)?
        .set_default("monitor.probe_timeout_secs", 5)?
        .set_default("monitor.lookup_timeout_secs", 5)?
        .set_default("monitor.concurrency", 8)?
        .set_default("retry.strategy", "fixed")?
        .set_default("retry.max_delay_secs", 3600)
}

fn finish(cfg: config::Config) -> Result<AppConfig, ConfigError> {
    let app_config: AppConfig = cfg.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub matrix: MatrixConfig,
    pub monitor: MonitorConfig,
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Reject configurations the monitor cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matrix.server_name.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "matrix.server_name",
                message: "must not be empty".into(),
            });
        }
        validate_user_id(&self.matrix.username)?;
        validate_room_id(&self.matrix.log_room)?;

        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "monitor.interval_secs",
                message: "must be a positive number of seconds".into(),
            });
        }
        if self.monitor.concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "monitor.concurrency",
                message: "must be at least 1".into(),
            });
        }
        if self.monitor.probe_timeout_secs == 0 || self.monitor.lookup_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "monitor.*_timeout_secs",
                message: "timeouts must be at least one second".into(),
            });
        }
        Ok(())
    }
}

#[derive(Deserialize, Clone)]
pub struct MatrixConfig {
    /// Homeserver used for login (e.g. "matrix.example.org" or "https://matrix.example.org").
    pub server_name: String,
    /// Full user ID of the monitoring account, e.g. `@fedwatch:example.org`.
    pub username: String,
    pub password: String,
    /// Room that receives reports. Never swept itself.
    pub log_room: String,
}

impl fmt::Debug for MatrixConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixConfig")
            .field("server_name", &self.server_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("log_room", &self.log_room)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,
    /// Timeout applied to each `/_matrix/federation/v1/version` probe.
    pub probe_timeout_secs: u64,
    /// Timeout applied to each well-known and SRV lookup.
    pub lookup_timeout_secs: u64,
    /// Maximum number of domains checked at once within one room.
    pub concurrency: usize,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    Fixed,
    Exponential,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub strategy: RetryStrategy,
    /// First retry delay. Falls back to the sweep interval when unset.
    pub base_delay_secs: Option<u64>,
    /// Upper bound for exponential backoff.
    pub max_delay_secs: u64,
}
