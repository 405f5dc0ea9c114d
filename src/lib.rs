//! # anchor-deque
//!
//! A lock-free double-ended queue for building higher-level concurrent stacks,
//! queues and work-distribution structures.
//!
//! ## Features
//!
//! - **Deque**: push and pop at both ends from any number of threads, no locks
//! - **Helping protocol**: any thread can finish another thread's half-completed push
//! - **Adapters**: LIFO [`stack::DequeStack`] and FIFO [`queue::DequeQueue`] built on the deque
//! - **Metrics**: optional contention and helping counters
//!
//! ## How it works
//!
//! The whole state of the deque is a single atomic pointer to an immutable
//! *anchor*: the two boundary nodes plus a status saying whether a link repair
//! is still owed. Every push and pop builds a fresh anchor and installs it with
//! one compare-and-swap. A push can not fix the neighbour's back-link in that
//! same step, so it leaves the anchor marked pending and whoever sees that
//! marker next repairs the link before doing anything else.
//!
//! Retired nodes and anchors are reclaimed through `crossbeam-epoch`, so a
//! thread that read an old anchor can keep dereferencing it until it unpins.
//!
//! ## Quick Start
//!
//! ```rust
//! use anchor_deque::Deque;
//!
//! let deque = Deque::new();
//! deque.push_right(10);
//! deque.push_right(20);
//! deque.push_left(5);
//!
//! assert_eq!(deque.pop_left(), Some(5));
//! assert_eq!(deque.pop_right(), Some(20));
//! assert_eq!(deque.len(), 1);
//! ```
//!
//! ## Consistency
//!
//! Pushes and pops are linearizable. `len`, `to_vec` and `iter` walk the
//! node chain and are only weakly consistent while other threads mutate the
//! deque; see [`Deque::to_vec`].

#![no_std]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(feature = "unstable", feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod backoff;
pub mod config;
#[cfg(feature = "std")]
pub mod deque;
pub mod metrics;
#[cfg(feature = "std")]
pub mod queue;
#[cfg(feature = "std")]
pub mod stack;

pub use crate::config::{BackoffConfig, DequeConfig};
#[cfg(feature = "std")]
pub use crate::deque::Deque;
#[cfg(feature = "std")]
pub use crate::queue::DequeQueue;
#[cfg(feature = "std")]
pub use crate::stack::DequeStack;

/// Common utilities and helper types
pub mod util {
    /// Pads a value to a full cache line so hot atomics do not share one
    #[repr(align(64))]
    #[derive(Default)]
    pub struct CachePadded<T> {
        value: T,
    }

    impl<T> CachePadded<T> {
        /// Create a new cache-padded value
        #[inline]
        pub const fn new(value: T) -> Self {
            Self { value }
        }
    }

    impl<T> core::ops::Deref for CachePadded<T> {
        type Target = T;

        #[inline]
        fn deref(&self) -> &T {
            &self.value
        }
    }

    impl<T: core::fmt::Debug> core::fmt::Debug for CachePadded<T> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Debug::fmt(&self.value, f)
        }
    }
}

/// Error types for anchor-deque operations
///
/// Deque operations themselves never fail: contention is retried internally and
/// emptiness is reported through `Option`. The only fallible surface is
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A configuration value is out of range
    InvalidConfig(&'static str),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type for anchor-deque operations
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_cache_padded() {
        let padded = util::CachePadded::new(42);
        assert_eq!(*padded, 42);
        assert_eq!(core::mem::align_of::<util::CachePadded<u8>>(), 64);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidConfig("sleep must be non-zero").to_string(),
            "Invalid configuration: sleep must be non-zero"
        );
    }
}
