//! RingSPSC - Bounded Wait-Free Single-Producer Single-Consumer Ring Buffer
//!
//! A fixed-capacity ring that moves values from exactly one producer thread to
//! exactly one consumer thread without locks, CAS loops or allocation on the
//! hot path.
//!
//! # Key Features
//!
//! - `head` / `tail` cursors on separate cache lines (`CachePadded`, platform sized)
//! - Acquire/Release publish protocol with cached cursors to avoid cross-core reads
//! - Non-blocking `try_enqueue` / `try_dequeue`; full and empty are plain results
//! - Single-owner handles: one `Producer`, one `Consumer`, enforced by the borrow checker
//! - Batch enqueue / consume with a single cursor store per batch
//! - Optional per-side metrics
//!
//! # Example
//!
//! ```
//! use ringspsc_rs::{Backoff, BoundedSpscRing};
//!
//! let mut ring = BoundedSpscRing::<u64>::new(1024)?;
//! let (mut producer, mut consumer) = ring.split();
//!
//! let sum = std::thread::scope(|s| {
//!     s.spawn(move || {
//!         let mut backoff = Backoff::new();
//!         for i in 0..100_000u64 {
//!             while !producer.try_enqueue(i) {
//!                 backoff.snooze();
//!             }
//!             backoff.reset();
//!         }
//!     });
//!
//!     let mut sum = 0u64;
//!     let mut received = 0;
//!     while received < 100_000 {
//!         received += consumer.consume_batch(|item| sum += item);
//!     }
//!     sum
//! });
//!
//! assert_eq!(sum, (0..100_000u64).sum());
//! # Ok::<(), ringspsc_rs::ConfigError>(())
//! ```

mod backoff;
mod config;
mod error;
mod handle;
mod invariants;
mod metrics;
mod ring;
mod sync;

pub use backoff::Backoff;
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_CAPACITY};
pub use error::ConfigError;
pub use handle::{Consumer, Producer};
pub use metrics::MetricsSnapshot;
pub use ring::{BoundedSpscRing, CACHE_LINE_SIZE};
