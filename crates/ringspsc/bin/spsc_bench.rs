//! # SPSC Ring Throughput Comparison
//!
//! Moves `messages` u64 values from one producer thread to one consumer thread
//! and prints a throughput table for:
//!
//! - `std::sync::mpsc::sync_channel` with the same bound (baseline)
//! - `BoundedSpscRing` with one `try_enqueue` / `try_dequeue` per value
//! - `BoundedSpscRing` with `push_slice` / `consume_batch`
//!
//! ## Running
//!
//! ```bash
//! cargo run -p ringspsc-rs --features demo --bin spsc_bench --release -- [messages] [capacity]
//! RUST_LOG=debug cargo run -p ringspsc-rs --features demo --bin spsc_bench --release
//! ```

use anyhow::{anyhow, ensure, Context};
use ringspsc_rs::{Backoff, BoundedSpscRing, Config};
use std::sync::mpsc;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const DEFAULT_MESSAGES: u64 = 10_000_000;
const DEFAULT_CAPACITY: usize = 4096;
const BATCH_SIZE: usize = 256;

struct Run {
    name: &'static str,
    elapsed: Duration,
    checksum: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let messages = match args.next() {
        Some(arg) => arg.parse::<u64>().with_context(|| format!("invalid message count {arg:?}"))?,
        None => DEFAULT_MESSAGES,
    };
    let capacity = match args.next() {
        Some(arg) => arg.parse::<usize>().with_context(|| format!("invalid capacity {arg:?}"))?,
        None => DEFAULT_CAPACITY,
    };
    let config = Config::new(capacity, true);
    config.validate().context("ring configuration rejected")?;

    println!("RingSPSC Throughput Comparison");
    println!("==============================\n");
    println!("Configuration:");
    println!("  Messages: {}", messages);
    println!("  Capacity: {} slots", capacity);
    println!("  Batch size: {}\n", BATCH_SIZE);

    tracing::info!(messages, capacity, "starting comparison");
    let expected = messages.wrapping_mul(messages.wrapping_sub(1)) / 2;
    let runs = [
        run_sync_channel(messages, capacity)?,
        run_ring_single(messages, config)?,
        run_ring_batch(messages, config)?,
    ];

    let baseline = runs[0].elapsed.as_secs_f64();
    println!("{:<24} {:>12} {:>14} {:>9}", "Variant", "Time", "M msgs/sec", "Speedup");
    println!("{}", "-".repeat(62));
    for run in &runs {
        ensure!(
            messages >= 1 << 32 || run.checksum == expected,
            "{} delivered a wrong checksum",
            run.name
        );
        let secs = run.elapsed.as_secs_f64();
        println!(
            "{:<24} {:>12.2?} {:>14.2} {:>8.2}x",
            run.name,
            run.elapsed,
            messages as f64 / secs / 1_000_000.0,
            baseline / secs,
        );
    }

    Ok(())
}

fn run_sync_channel(messages: u64, capacity: usize) -> anyhow::Result<Run> {
    let (tx, rx) = mpsc::sync_channel::<u64>(capacity);
    let start = Instant::now();

    let producer = thread::spawn(move || {
        for i in 0..messages {
            if tx.send(i).is_err() {
                break;
            }
        }
    });

    let checksum = rx.iter().fold(0u64, u64::wrapping_add);
    producer
        .join()
        .map_err(|_| anyhow!("sync_channel producer thread panicked"))?;

    Ok(Run {
        name: "sync_channel",
        elapsed: start.elapsed(),
        checksum,
    })
}

fn run_ring_single(messages: u64, config: Config) -> anyhow::Result<Run> {
    let mut ring = BoundedSpscRing::<u64>::with_config(config)?;
    let (mut producer, mut consumer) = ring.split();
    let start = Instant::now();

    let checksum = thread::scope(|s| {
        let mut producer_thread = Some(s.spawn(move || {
            let mut backoff = Backoff::new();
            for i in 0..messages {
                while !producer.try_enqueue(i) {
                    backoff.snooze();
                }
                backoff.reset();
            }
        }));

        let mut checksum = 0u64;
        let mut received = 0u64;
        let mut backoff = Backoff::new();
        while received < messages {
            match consumer.try_dequeue() {
                Some(v) => {
                    checksum = checksum.wrapping_add(v);
                    received += 1;
                    backoff.reset();
                }
                None => {
                    reap_finished(&mut producer_thread)?;
                    backoff.snooze();
                }
            }
        }
        if let Some(handle) = producer_thread {
            join_producer(handle)?;
        }
        Ok::<_, anyhow::Error>(checksum)
    })?;
    let elapsed = start.elapsed();

    tracing::debug!(metrics = ?ring.metrics(), "ring single-item run finished");
    Ok(Run {
        name: "ring try_enqueue",
        elapsed,
        checksum,
    })
}

fn run_ring_batch(messages: u64, config: Config) -> anyhow::Result<Run> {
    let mut ring = BoundedSpscRing::<u64>::with_config(config)?;
    let (mut producer, mut consumer) = ring.split();
    let start = Instant::now();

    let checksum = thread::scope(|s| {
        let mut producer_thread = Some(s.spawn(move || {
            let mut batch = Vec::with_capacity(BATCH_SIZE);
            let mut next = 0u64;
            let mut backoff = Backoff::new();
            while next < messages {
                batch.clear();
                let end = messages.min(next + BATCH_SIZE as u64);
                batch.extend(next..end);

                let mut sent = 0;
                while sent < batch.len() {
                    let n = producer.push_slice(&batch[sent..]);
                    if n == 0 {
                        backoff.snooze();
                    } else {
                        backoff.reset();
                    }
                    sent += n;
                }
                next = end;
            }
        }));

        let mut checksum = 0u64;
        let mut received = 0u64;
        let mut backoff = Backoff::new();
        while received < messages {
            let n = consumer.consume_batch(|v| checksum = checksum.wrapping_add(v));
            if n == 0 {
                reap_finished(&mut producer_thread)?;
                backoff.snooze();
            } else {
                received += n as u64;
                backoff.reset();
            }
        }
        if let Some(handle) = producer_thread {
            join_producer(handle)?;
        }
        Ok::<_, anyhow::Error>(checksum)
    })?;
    let elapsed = start.elapsed();

    tracing::debug!(metrics = ?ring.metrics(), "ring batch run finished");
    Ok(Run {
        name: "ring push_slice/batch",
        elapsed,
        checksum,
    })
}

/// Joins the producer as soon as it has stopped, so a panic surfaces as an
/// error instead of leaving the consumer waiting on items that never come.
fn reap_finished(producer_thread: &mut Option<ScopedJoinHandle<'_, ()>>) -> anyhow::Result<()> {
    if producer_thread.as_ref().is_some_and(ScopedJoinHandle::is_finished) {
        if let Some(handle) = producer_thread.take() {
            join_producer(handle)?;
        }
    }
    Ok(())
}

fn join_producer(handle: ScopedJoinHandle<'_, ()>) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|_| anyhow!("ring producer thread panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_panic_surfaces_as_error() {
        let result = thread::scope(|s| {
            let mut producer_thread = Some(s.spawn(|| panic!("producer failed")));
            while producer_thread.is_some() {
                reap_finished(&mut producer_thread)?;
                thread::yield_now();
            }
            Ok::<_, anyhow::Error>(())
        });

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "ring producer thread panicked");
    }

    #[test]
    fn test_clean_producer_joins_ok() {
        thread::scope(|s| {
            let handle = s.spawn(|| {});
            assert!(join_producer(handle).is_ok());
        });
    }

    #[test]
    fn test_sync_channel_run_checksum() {
        let run = run_sync_channel(1_000, 16).unwrap();
        assert_eq!(run.checksum, 1_000 * 999 / 2);
    }

    #[test]
    fn test_ring_runs_checksum() {
        let config = Config::new(64, true);
        assert_eq!(run_ring_single(10_000, config).unwrap().checksum, 10_000 * 9_999 / 2);
        assert_eq!(run_ring_batch(10_000, config).unwrap().checksum, 10_000 * 9_999 / 2);
    }
}
