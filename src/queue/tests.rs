//! Tests for the FIFO queue

use super::*;
use crate::metrics::MetricsCollector;
use crate::DequeConfig;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::vec;
use std::vec::Vec;

#[test]
fn test_fifo_order() {
    let queue = DequeQueue::new();
    assert_eq!(queue.pop(), None);

    for i in 0..10 {
        queue.push(i);
    }
    assert_eq!(queue.len(), 10);
    assert_eq!(queue.peek(), Some(0));

    for i in 0..10 {
        assert_eq!(queue.pop(), Some(i));
    }
    assert!(queue.is_empty());
}

#[test]
fn test_push_front_jumps_queue() {
    let queue = DequeQueue::new();
    queue.push(2);
    queue.push(3);
    queue.push_front(1);
    assert_eq!(queue.pop(), Some(1));
    assert_eq!(queue.pop(), Some(2));
}

#[test]
fn test_with_config() {
    let queue: DequeQueue<u8> =
        DequeQueue::with_config(DequeConfig::default().with_metrics(false)).unwrap();
    assert!(!queue.is_metrics_enabled());
}

#[test]
fn test_mpmc_stress() {
    let queue = Arc::new(DequeQueue::new());
    let num_producers = 8;
    let num_consumers = 8;
    let items_per_producer = 10_000;
    let total = num_producers * items_per_producer;

    let producers: Vec<_> = (0..num_producers)
        .map(|producer_id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..items_per_producer {
                    queue.push(producer_id * items_per_producer + i);
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..num_consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut consumed = Vec::new();
                while consumed.len() < total / num_consumers {
                    match queue.pop() {
                        Some(value) => consumed.push(value),
                        None => thread::sleep(Duration::from_micros(50)),
                    }
                }
                consumed
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    let mut all = Vec::with_capacity(total);
    for consumer in consumers {
        let consumed = consumer.join().unwrap();
        // Each producer's values reach a given consumer in push order
        let mut last = vec![None; num_producers];
        for &value in &consumed {
            let producer = value / items_per_producer;
            if let Some(previous) = last[producer] {
                assert!(value > previous);
            }
            last[producer] = Some(value);
        }
        all.extend(consumed);
    }

    all.sort_unstable();
    assert_eq!(all, (0..total).collect::<Vec<_>>());
    assert!(queue.is_empty());
}
