//! Deque configuration
//!
//! Tuning knobs for contention handling and metrics collection. None of them
//! change what the deque does, only how eagerly a losing thread retries.

use crate::{Error, Result};
use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest accepted spin exponent; `2^16` spins is already far past useful.
pub const MAX_SPIN_LIMIT: u32 = 16;

/// Retry policy applied after a lost compare-and-swap
///
/// Each failed attempt advances one step. Up to `spin_limit` the thread busy
/// spins `2^step` times, up to `yield_limit` it yields to the scheduler, and
/// after that it sleeps for `sleep` per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackoffConfig {
    /// Last step that spins instead of yielding
    pub spin_limit: u32,
    /// Last step that yields instead of sleeping
    pub yield_limit: u32,
    /// Sleep applied once yielding is exhausted
    pub sleep: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            spin_limit: 6,
            yield_limit: 10,
            sleep: Duration::from_micros(50),
        }
    }
}

impl BackoffConfig {
    /// Check that the limits are ordered and in range
    pub fn validate(&self) -> Result<()> {
        if self.spin_limit > MAX_SPIN_LIMIT {
            return Err(Error::InvalidConfig("spin_limit must be at most 16"));
        }
        if self.yield_limit < self.spin_limit {
            return Err(Error::InvalidConfig(
                "yield_limit must not be below spin_limit",
            ));
        }
        if self.sleep.is_zero() {
            return Err(Error::InvalidConfig("sleep must be non-zero"));
        }
        Ok(())
    }
}

/// Configuration for a [`Deque`](crate::Deque)
///
/// # Examples
///
/// ```rust
/// use anchor_deque::{BackoffConfig, DequeConfig};
/// use std::time::Duration;
///
/// let config = DequeConfig::default()
///     .with_metrics(false)
///     .with_backoff(BackoffConfig {
///         spin_limit: 4,
///         yield_limit: 8,
///         sleep: Duration::from_micros(10),
///     });
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DequeConfig {
    /// Contention policy
    pub backoff: BackoffConfig,
    /// Whether operation counters are recorded from the start
    pub metrics_enabled: bool,
}

impl Default for DequeConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffConfig::default(),
            metrics_enabled: true,
        }
    }
}

impl DequeConfig {
    /// Replace the backoff policy
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Turn metrics collection on or off
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Validate every nested setting
    pub fn validate(&self) -> Result<()> {
        self.backoff.validate()
    }
}
