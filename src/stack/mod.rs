//! Stack Module
//!
//! LIFO stack built on the lock-free deque.

pub mod lock_free;

pub use lock_free::DequeStack;
