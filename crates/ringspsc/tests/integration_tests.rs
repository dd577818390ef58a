#![cfg(not(loom))]

use ringspsc_rs::{Backoff, BoundedSpscRing, Config};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[test]
fn test_fifo_ordering_single_thread() {
    let mut ring = BoundedSpscRing::<u64>::new(1024).unwrap();
    let (mut producer, mut consumer) = ring.split();

    const N: u64 = 10_000;
    let mut next_send = 0;
    let mut expected = 0;

    // Interleave bursts so the cursors wrap the slot array many times.
    while expected < N {
        for _ in 0..700 {
            if next_send == N || !producer.try_enqueue(next_send) {
                break;
            }
            next_send += 1;
        }
        while let Some(item) = consumer.try_dequeue() {
            assert_eq!(item, expected, "FIFO violation: expected {}, got {}", expected, item);
            expected += 1;
        }
    }

    assert_eq!(expected, N);
    assert!(consumer.is_empty());
}

#[test]
fn test_concurrent_stress_sum() {
    const ITEMS: u64 = 1_000_000;

    let mut ring = BoundedSpscRing::<u64>::new(1024).unwrap();
    let (mut producer, mut consumer) = ring.split();

    let (sum, count) = thread::scope(|s| {
        s.spawn(move || {
            let mut backoff = Backoff::new();
            for i in 0..ITEMS {
                while !producer.try_enqueue(i) {
                    backoff.snooze();
                }
                backoff.reset();
            }
        });

        let consumer_handle = s.spawn(move || {
            let mut sum = 0u64;
            let mut count = 0u64;
            let mut backoff = Backoff::new();
            while count < ITEMS {
                match consumer.try_dequeue() {
                    Some(item) => {
                        assert_eq!(item, count, "out of order at position {}", count);
                        sum += item;
                        count += 1;
                        backoff.reset();
                    }
                    None => backoff.snooze(),
                }
            }
            (sum, count)
        });

        consumer_handle.join().unwrap()
    });

    assert_eq!(count, ITEMS);
    assert_eq!(sum, ITEMS * (ITEMS - 1) / 2);
    assert!(ring.is_empty());
}

#[test]
fn test_no_loss_no_duplication_owned_values() {
    const ITEMS: usize = 20_000;

    let mut ring = BoundedSpscRing::<String>::new(64).unwrap();
    let (mut producer, mut consumer) = ring.split();

    let received = thread::scope(|s| {
        s.spawn(move || {
            for i in 0..ITEMS {
                let mut value = format!("item-{}", i % 1_000);
                loop {
                    match producer.try_push(value) {
                        Ok(()) => break,
                        Err(back) => {
                            value = back;
                            thread::yield_now();
                        }
                    }
                }
            }
        });

        let mut received: Vec<String> = Vec::with_capacity(ITEMS);
        while received.len() < ITEMS {
            if consumer.consume_up_to(32, |item| received.push(item)) == 0 {
                thread::yield_now();
            }
        }
        received
    });

    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in received {
        *counts.entry(item).or_default() += 1;
    }
    assert_eq!(counts.len(), 1_000);
    assert!(counts.values().all(|&c| c == ITEMS / 1_000));
}

#[test]
fn test_batch_transfer_concurrent() {
    const ITEMS: u64 = 200_000;
    const BATCH: usize = 256;

    let mut ring = BoundedSpscRing::<u64>::with_config(Config::new(512, true)).unwrap();
    let (mut producer, mut consumer) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            let batch: Vec<u64> = (0..ITEMS).collect();
            let mut sent = 0usize;
            while sent < batch.len() {
                let end = (sent + BATCH).min(batch.len());
                let n = producer.push_slice(&batch[sent..end]);
                if n == 0 {
                    std::hint::spin_loop();
                }
                sent += n;
            }
        });

        s.spawn(move || {
            let mut expected = 0u64;
            while expected < ITEMS {
                consumer.consume_up_to(BATCH, |item| {
                    assert_eq!(item, expected);
                    expected += 1;
                });
            }
        });
    });

    let metrics = ring.metrics();
    assert_eq!(metrics.enqueued, ITEMS);
    assert_eq!(metrics.dequeued, ITEMS);
    assert_eq!(metrics.in_flight(), 0);
    assert!(metrics.enqueue_batches <= ITEMS);
}

#[test]
fn test_len_bounded_under_concurrency() {
    const ITEMS: u64 = 200_000;

    let mut ring = BoundedSpscRing::<u64>::new(64).unwrap();
    let (mut producer, mut consumer) = ring.split();
    let shared = producer.ring();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        let done = &done;

        s.spawn(move || {
            let mut last_position = 0;
            for i in 0..ITEMS {
                while !producer.try_enqueue(i) {
                    thread::yield_now();
                }
                let position = producer.position();
                assert!(position > last_position, "head went backwards");
                last_position = position;
            }
        });

        s.spawn(move || {
            let mut last_position = 0;
            let mut received = 0;
            while received < ITEMS {
                if consumer.try_dequeue().is_some() {
                    received += 1;
                    let position = consumer.position();
                    assert!(position > last_position, "tail went backwards");
                    last_position = position;
                }
            }
            done.store(true, Ordering::Release);
        });

        // Monitoring thread: len() is approximate but always within bounds.
        s.spawn(move || {
            while !done.load(Ordering::Acquire) {
                let len = shared.len();
                assert!(len <= shared.capacity(), "len {} > capacity", len);
            }
        });
    });

    assert!(ring.is_empty());
}
