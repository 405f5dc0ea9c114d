//! Work distribution over a shared deque
//!
//! Producers enqueue regular jobs at the right end and urgent jobs at the
//! left end, so urgent work jumps the line. Workers take from the left.

use anchor_deque::metrics::MetricsCollector;
use anchor_deque::{BackoffConfig, Deque, DequeConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Job {
    id: u64,
    urgent: bool,
    workload: usize,
}

impl Job {
    fn run(&self) -> f64 {
        (0..self.workload).map(|i| (i as f64).sqrt()).sum()
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    jobs: usize,
    urgent: usize,
    idle_polls: usize,
}

const NUM_PRODUCERS: u64 = 2;
const NUM_WORKERS: usize = 4;
const JOBS_PER_PRODUCER: u64 = 2_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("anchor-deque work distribution demo");
    println!("===================================");

    let config = DequeConfig::default().with_backoff(BackoffConfig {
        spin_limit: 4,
        yield_limit: 8,
        sleep: Duration::from_micros(20),
    });
    let jobs: Arc<Deque<Job>> = Arc::new(Deque::with_config(config)?);
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(NUM_PRODUCERS as usize + NUM_WORKERS));
    let start = Instant::now();

    let producers: Vec<_> = (0..NUM_PRODUCERS)
        .map(|p| {
            let jobs = Arc::clone(&jobs);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..JOBS_PER_PRODUCER {
                    let job = Job {
                        id: p * JOBS_PER_PRODUCER + i,
                        urgent: i % 10 == 0,
                        workload: 500 + (i as usize % 7) * 100,
                    };
                    if job.urgent {
                        jobs.push_left(job);
                    } else {
                        jobs.push_right(job);
                    }
                }
            })
        })
        .collect();

    let workers: Vec<_> = (0..NUM_WORKERS)
        .map(|_| {
            let jobs = Arc::clone(&jobs);
            let done = Arc::clone(&done);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut stats = WorkerStats::default();
                let mut checksum = 0.0;
                loop {
                    match jobs.pop_left() {
                        Some(job) => {
                            checksum += job.run();
                            stats.jobs += 1;
                            if job.urgent {
                                stats.urgent += 1;
                            }
                        }
                        None if done.load(Ordering::Acquire) => break,
                        None => {
                            stats.idle_polls += 1;
                            thread::yield_now();
                        }
                    }
                }
                (stats, checksum)
            })
        })
        .collect();

    for producer in producers {
        producer.join().map_err(|_| "producer panicked")?;
    }
    done.store(true, Ordering::Release);

    let mut total_jobs = 0;
    for (id, worker) in workers.into_iter().enumerate() {
        let (stats, checksum) = worker.join().map_err(|_| "worker panicked")?;
        println!(
            "  worker {}: {} jobs ({} urgent), {} idle polls, checksum {:.1}",
            id, stats.jobs, stats.urgent, stats.idle_polls, checksum
        );
        total_jobs += stats.jobs;
    }

    let elapsed = start.elapsed();
    let metrics = jobs.metrics();
    println!("\nProcessed {} jobs in {:?}", total_jobs, elapsed);
    println!("  Success rate: {:.2}%", metrics.success_rate());
    println!("  Contention rate: {:.2}%", metrics.contention_rate());
    println!("  Helped operations: {}", metrics.helped_operations);
    println!("  Avg operation time: {:?}", metrics.avg_operation_time());

    assert_eq!(total_jobs as u64, NUM_PRODUCERS * JOBS_PER_PRODUCER);
    assert!(jobs.is_empty());
    if let Some(job) = jobs.peek_left() {
        println!("unexpected leftover job {}", job.id);
    }

    Ok(())
}
