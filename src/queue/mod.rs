//! Queue implementations
//!
//! FIFO queue built on the lock-free deque: producers push on the right,
//! consumers pop from the left.
//!
//! ## Characteristics
//!
//! | Operation | Cost | Notes |
//! |-----------|------|-------|
//! | push | O(1) | Never fails, unbounded |
//! | pop | O(1) | `None` only when observed empty |
//! | len | O(n) | Weak snapshot |
//!
//! ## Examples
//!
//! ```rust
//! use anchor_deque::queue::DequeQueue;
//!
//! let queue = DequeQueue::new();
//! queue.push("first");
//! queue.push("second");
//! assert_eq!(queue.pop(), Some("first"));
//! ```

pub mod fifo;

pub use fifo::DequeQueue;

#[cfg(test)]
mod tests;
