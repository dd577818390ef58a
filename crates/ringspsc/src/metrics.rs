use crate::sync::{AtomicU64, Ordering};

/// Point-in-time copy of a ring's counters.
///
/// All zero unless the ring was built with `enable_metrics`. Counters from
/// the two sides are read independently, so a snapshot taken while both
/// sides run is approximate in the same way as `len()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Items accepted by `try_enqueue` / `try_push` / `push_slice`.
    pub enqueued: u64,
    /// Items handed out by `try_dequeue` / `consume_batch` / `consume_up_to`.
    pub dequeued: u64,
    /// `try_enqueue` / `try_push` / `push_slice` calls that found the ring full.
    pub full_rejections: u64,
    /// `try_dequeue` / batch calls that found the ring empty.
    pub empty_polls: u64,
    /// `head` publishes. Every successful enqueue call counts once, so a
    /// single `try_enqueue` is a batch of one.
    pub enqueue_batches: u64,
    /// `tail` publishes. Every call that dequeues at least one item counts
    /// once, so a single `try_dequeue` is a batch of one.
    pub dequeue_batches: u64,
}

impl MetricsSnapshot {
    /// Items enqueued but not yet dequeued at snapshot time.
    pub fn in_flight(&self) -> u64 {
        self.enqueued.saturating_sub(self.dequeued)
    }
}

// Each side owns its counters and they live in that side's padded cursor
// region, so updates are single-writer: a relaxed load + store, no RMW.
#[inline]
fn bump(counter: &AtomicU64, n: u64) {
    counter.store(counter.load(Ordering::Relaxed).wrapping_add(n), Ordering::Relaxed);
}

/// Counters written only by the producer.
pub(crate) struct ProducerMetrics {
    enqueued: AtomicU64,
    full_rejections: AtomicU64,
    batches: AtomicU64,
}

impl ProducerMetrics {
    pub(crate) fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            full_rejections: AtomicU64::new(0),
            batches: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_enqueued(&self, n: u64) {
        bump(&self.enqueued, n);
        bump(&self.batches, 1);
    }

    #[inline]
    pub(crate) fn record_full(&self) {
        bump(&self.full_rejections, 1);
    }
}

/// Counters written only by the consumer.
pub(crate) struct ConsumerMetrics {
    dequeued: AtomicU64,
    empty_polls: AtomicU64,
    batches: AtomicU64,
}

impl ConsumerMetrics {
    pub(crate) fn new() -> Self {
        Self {
            dequeued: AtomicU64::new(0),
            empty_polls: AtomicU64::new(0),
            batches: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_dequeued(&self, n: u64) {
        bump(&self.dequeued, n);
        bump(&self.batches, 1);
    }

    #[inline]
    pub(crate) fn record_empty(&self) {
        bump(&self.empty_polls, 1);
    }
}

pub(crate) fn snapshot(producer: &ProducerMetrics, consumer: &ConsumerMetrics) -> MetricsSnapshot {
    MetricsSnapshot {
        enqueued: producer.enqueued.load(Ordering::Relaxed),
        dequeued: consumer.dequeued.load(Ordering::Relaxed),
        full_rejections: producer.full_rejections.load(Ordering::Relaxed),
        empty_polls: consumer.empty_polls.load(Ordering::Relaxed),
        enqueue_batches: producer.batches.load(Ordering::Relaxed),
        dequeue_batches: consumer.batches.load(Ordering::Relaxed),
    }
}
