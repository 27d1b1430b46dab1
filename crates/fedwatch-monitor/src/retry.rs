//! Delay policy for retrying a sweep cycle whose room listing failed.

use std::time::Duration;

use fedwatch_common::config::{AppConfig, RetryStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Same delay after every failure.
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        let base = config
            .retry
            .base_delay_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.monitor.interval());
        match config.retry.strategy {
            RetryStrategy::Fixed => Self::Fixed(base),
            RetryStrategy::Exponential => Self::Exponential {
                base,
                max: Duration::from_secs(config.retry.max_delay_secs).max(base),
            },
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}
