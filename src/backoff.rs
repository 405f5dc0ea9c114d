//! Exponential backoff for contended retries

use crate::config::BackoffConfig;
use core::hint;

#[cfg(feature = "std")]
use tracing::trace;

/// Per-operation retry state
///
/// Created on the stack at the start of a push or pop and advanced with
/// [`snooze`](Backoff::snooze) after every lost compare-and-swap. It never
/// waits for another thread to finish anything; it only spreads retries out.
#[derive(Debug, Clone)]
pub struct Backoff {
    step: u32,
    config: BackoffConfig,
}

impl Backoff {
    /// Start a fresh backoff sequence
    #[inline]
    pub fn new(config: BackoffConfig) -> Self {
        Self { step: 0, config }
    }

    /// Return to the first spinning step
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Current step, starting at zero
    #[inline]
    pub fn step(&self) -> u32 {
        self.step
    }

    /// `true` once the spinning phase is over
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > self.config.spin_limit
    }

    /// Wait a little, escalating from spinning to yielding to sleeping
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= self.config.spin_limit {
            for _ in 0..(1u32 << self.step) {
                hint::spin_loop();
            }
        } else {
            self.relax();
        }

        if self.step <= self.config.yield_limit {
            self.step += 1;
        }
    }

    #[cfg(feature = "std")]
    fn relax(&self) {
        if self.step <= self.config.yield_limit {
            std::thread::yield_now();
        } else {
            trace!(sleep_us = self.config.sleep.as_micros() as u64, "backoff sleeping");
            std::thread::sleep(self.config.sleep);
        }
    }

    #[cfg(not(feature = "std"))]
    fn relax(&self) {
        for _ in 0..(1u32 << self.config.spin_limit) {
            hint::spin_loop();
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
