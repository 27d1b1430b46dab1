//! # fedwatch-common
//!
//! Shared configuration, startup errors, and identifier helpers used across all
//! fedwatch crates. No network code lives here.

pub mod config;
pub mod error;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use validation::extract_domain;
