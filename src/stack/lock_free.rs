//! Lock-Free Stack on top of the deque
//!
//! Pushes and pops both work the right end, which the deque keeps in LIFO
//! order. Other threads may still reach the left end through
//! [`as_deque`](DequeStack::as_deque), e.g. to steal the oldest entry.

use crate::deque::Deque;
use crate::metrics::{MetricsCollector, PerformanceMetrics};
use std::vec::Vec;

/// A lock-free LIFO stack
///
/// # Examples
///
/// ```rust
/// use anchor_deque::DequeStack;
///
/// let stack = DequeStack::new();
/// stack.push(1);
/// stack.push(2);
/// stack.push(3);
///
/// assert_eq!(stack.pop(), Some(3));
/// assert_eq!(stack.pop(), Some(2));
/// assert_eq!(stack.pop(), Some(1));
/// assert_eq!(stack.pop(), None);
/// ```
#[derive(Debug, Default)]
pub struct DequeStack<T> {
    deque: Deque<T>,
}

impl<T> DequeStack<T> {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            deque: Deque::new(),
        }
    }

    /// Wrap an existing deque; its right end becomes the top
    pub fn from_deque(deque: Deque<T>) -> Self {
        Self { deque }
    }

    /// The underlying deque
    pub fn as_deque(&self) -> &Deque<T> {
        &self.deque
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    /// Number of elements; walks the stack, see [`Deque::len`]
    pub fn len(&self) -> usize {
        self.deque.len()
    }
}

impl<T: Send + 'static> DequeStack<T> {
    /// Push a value onto the top
    pub fn push(&self, value: T) {
        self.deque.push_right(value);
    }

    /// Push every value in order; the last one ends up on top
    pub fn push_batch<I>(&self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.push(value);
        }
    }
}

impl<T: Clone + Send + 'static> DequeStack<T> {
    /// Pop the top value
    pub fn pop(&self) -> Option<T> {
        self.deque.pop_right()
    }

    /// Read the top value without removing it
    pub fn peek(&self) -> Option<T> {
        self.deque.peek_right()
    }

    /// Pop up to `max_count` values, top first
    ///
    /// Each pop is a separate operation; other threads may interleave.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anchor_deque::DequeStack;
    ///
    /// let stack = DequeStack::new();
    /// stack.push_batch(vec![1, 2, 3]);
    /// assert_eq!(stack.pop_batch(2), vec![3, 2]);
    /// ```
    pub fn pop_batch(&self, max_count: usize) -> Vec<T> {
        let mut result = Vec::new();
        for _ in 0..max_count {
            match self.pop() {
                Some(value) => result.push(value),
                None => break,
            }
        }
        result
    }
}

impl<T> MetricsCollector for DequeStack<T> {
    fn metrics(&self) -> PerformanceMetrics {
        self.deque.metrics()
    }

    fn reset_metrics(&self) {
        self.deque.reset_metrics();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.deque.set_metrics_enabled(enabled);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.deque.is_metrics_enabled()
    }
}
