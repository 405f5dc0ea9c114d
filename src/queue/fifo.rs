//! Unbounded multi-producer, multi-consumer FIFO queue

use crate::config::DequeConfig;
use crate::deque::Deque;
use crate::metrics::{MetricsCollector, PerformanceMetrics};
use crate::Result;

/// A lock-free unbounded FIFO queue
///
/// # Examples
///
/// ```rust
/// use anchor_deque::DequeQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(DequeQueue::new());
///
/// let producer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         for i in 0..100 {
///             queue.push(i);
///         }
///     }
/// });
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         let mut received = Vec::new();
///         while received.len() < 100 {
///             if let Some(value) = queue.pop() {
///                 received.push(value);
///             }
///         }
///         received
///     }
/// });
///
/// producer.join().unwrap();
/// let received = consumer.join().unwrap();
/// assert_eq!(received, (0..100).collect::<Vec<_>>());
/// ```
#[derive(Debug, Default)]
pub struct DequeQueue<T> {
    deque: Deque<T>,
}

impl<T> DequeQueue<T> {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            deque: Deque::new(),
        }
    }

    /// Create a queue with a custom configuration
    pub fn with_config(config: DequeConfig) -> Result<Self> {
        Ok(Self {
            deque: Deque::with_config(config)?,
        })
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    /// Number of queued elements; walks the queue, see [`Deque::len`]
    pub fn len(&self) -> usize {
        self.deque.len()
    }
}

impl<T: Send + 'static> DequeQueue<T> {
    /// Append a value at the back
    pub fn push(&self, value: T) {
        self.deque.push_right(value);
    }

    /// Put a value back at the front, ahead of everything queued
    pub fn push_front(&self, value: T) {
        self.deque.push_left(value);
    }
}

impl<T: Clone + Send + 'static> DequeQueue<T> {
    /// Take the oldest value
    pub fn pop(&self) -> Option<T> {
        self.deque.pop_left()
    }

    /// Read the oldest value without removing it
    pub fn peek(&self) -> Option<T> {
        self.deque.peek_left()
    }
}

impl<T> MetricsCollector for DequeQueue<T> {
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
