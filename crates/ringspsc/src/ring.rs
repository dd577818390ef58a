use crate::invariants::{
    debug_assert_bounded_count, debug_assert_initialized_read, debug_assert_monotonic,
    debug_assert_tail_not_past_head,
};
use crate::metrics::{self, ConsumerMetrics, MetricsSnapshot, ProducerMetrics};
use crate::sync::{AtomicU64, Ordering, UnsafeCell};
use crate::{Config, ConfigError, Consumer, Producer};
use crossbeam_utils::CachePadded;
use std::fmt;
use std::mem::{self, MaybeUninit};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ## Cursors
//
// `head` counts elements ever enqueued, `tail` counts elements ever dequeued.
// Both are unbounded u64 sequence numbers; a slot index is `seq & mask`.
// The ring is empty when `head == tail` and full when `head - tail == capacity`.
//
// ## Memory Ordering Protocol
//
// **Producer (enqueue):**
// 1. Load `head` with Relaxed (only the producer writes head)
// 2. Read `cached_tail` (UnsafeCell, producer-private)
// 3. If the cache shows no room: load `tail` with Acquire, refresh the cache
// 4. Write the value into `slots[head & mask]`
// 5. Store `head + 1` with Release (publishes the slot write)
//
// **Consumer (dequeue):**
// 1. Load `tail` with Relaxed (only the consumer writes tail)
// 2. Read `cached_head` (UnsafeCell, consumer-private)
// 3. If the cache shows nothing: load `head` with Acquire, refresh the cache
// 4. Move the value out of `slots[tail & mask]`
// 5. Store `tail + 1` with Release (hands the slot back to the producer)
//
// A cached cursor is always a value previously obtained by an Acquire load,
// so reading slots covered by the cache is ordered after the other side's
// Release store of that value.
//
// ## Layout
//
// `head` and `cached_tail` share one `CachePadded` region, `tail` and
// `cached_head` another. Each region is written by one side only, so the
// producer publishing `head` never invalidates the line holding `tail` and
// vice versa. The read-only config follows on its own line; the slot array
// is a separate allocation.
//
// ## Single-Writer Invariants
//
// - `head`, `cached_tail`, producer metrics: written only by `Producer`
// - `tail`, `cached_head`, consumer metrics: written only by `Consumer`
// - `slots[i]`: written by the producer while `seq(i)` is in
//   `[head, tail + capacity)`, read-then-freed by the consumer while in
//   `[tail, head)`
//
// `split(&mut self)` hands out exactly one of each handle and their methods
// take `&mut self`, so safe code cannot break these.
//
// =============================================================================

/// Alignment (and padding) used to isolate the producer and consumer cursors.
///
/// Computed from the target by `crossbeam_utils::CachePadded`: 128 bytes on
/// x86_64 and aarch64 (adjacent-line prefetch), 64 or 32 bytes elsewhere.
pub const CACHE_LINE_SIZE: usize = mem::align_of::<CachePadded<u8>>();

type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// Producer-owned cache line.
#[repr(C)]
struct ProducerSide {
    /// Elements ever enqueued (written by producer, read by consumer)
    head: AtomicU64,
    /// Producer's last observed `tail`
    cached_tail: UnsafeCell<u64>,
    metrics: ProducerMetrics,
}

/// Consumer-owned cache line.
#[repr(C)]
struct ConsumerSide {
    /// Elements ever dequeued (written by consumer, read by producer)
    tail: AtomicU64,
    /// Consumer's last observed `head`
    cached_head: UnsafeCell<u64>,
    metrics: ConsumerMetrics,
}

/// Bounded wait-free single-producer single-consumer ring buffer.
///
/// Capacity is a power of two fixed at construction. Values move from one
/// [`Producer`] to one [`Consumer`], both obtained from [`split`](Self::split).
/// Neither side ever blocks: a full ring rejects the enqueue, an empty ring
/// returns `None`, and the caller decides whether to retry (see
/// [`Backoff`](crate::Backoff)).
///
/// ```
/// use ringspsc_rs::BoundedSpscRing;
///
/// let mut ring = BoundedSpscRing::<u64>::new(1024)?;
/// let (mut producer, mut consumer) = ring.split();
///
/// std::thread::scope(|s| {
///     s.spawn(move || {
///         for i in 0..10_000u64 {
///             while !producer.try_enqueue(i) {
///                 std::hint::spin_loop();
///             }
///         }
///     });
///     s.spawn(move || {
///         let mut expected = 0u64;
///         while expected < 10_000 {
///             if let Some(v) = consumer.try_dequeue() {
///                 assert_eq!(v, expected);
///                 expected += 1;
///             }
///         }
///     });
/// });
/// assert!(ring.is_empty());
/// # Ok::<(), ringspsc_rs::ConfigError>(())
/// ```
#[repr(C)]
pub struct BoundedSpscRing<T> {
    // === PRODUCER HOT === (cache-line aligned)
    producer: CachePadded<ProducerSide>,

    // === CONSUMER HOT === (cache-line aligned)
    consumer: CachePadded<ConsumerSide>,

    // === READ-ONLY ===
    mask: usize,
    config: Config,
    /// Fixed-size slot storage, allocated once in `with_config`.
    slots: Box<[Slot<T>]>,
}

// SAFETY: values of T are moved between threads, never shared, so T: Send is
// enough. Cross-thread access to the cursors goes through atomics; the
// UnsafeCell fields follow the single-writer rules above.
unsafe impl<T: Send> Send for BoundedSpscRing<T> {}
unsafe impl<T: Send> Sync for BoundedSpscRing<T> {}

impl<T> BoundedSpscRing<T> {
    /// Creates a ring with `capacity` slots and metrics disabled.
    ///
    /// Fails with [`ConfigError`] when `capacity` is zero, not a power of two,
    /// or above [`MAX_CAPACITY`](crate::MAX_CAPACITY).
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(Config::new(capacity, false))
    }

    /// Creates a ring from a full [`Config`].
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let capacity = config.capacity();
        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        tracing::debug!(
            capacity,
            slot_size = mem::size_of::<T>(),
            cache_line = CACHE_LINE_SIZE,
            metrics = config.enable_metrics,
            "created spsc ring"
        );

        Ok(Self {
            producer: CachePadded::new(ProducerSide {
                head: AtomicU64::new(0),
                cached_tail: UnsafeCell::new(0),
                metrics: ProducerMetrics::new(),
            }),
            consumer: CachePadded::new(ConsumerSide {
                tail: AtomicU64::new(0),
                cached_head: UnsafeCell::new(0),
                metrics: ConsumerMetrics::new(),
            }),
            mask: config.mask(),
            config,
            slots,
        })
    }

    /// Splits the ring into its producer and consumer handles.
    ///
    /// Both handles borrow the ring, so it cannot be dropped or split again
    /// until both are gone. Move them into two threads of a
    /// `std::thread::scope` to get the start/join lifecycle.
    pub fn split(&mut self) -> (Producer<'_, T>, Consumer<'_, T>) {
        let ring: &Self = self;
        (Producer::new(ring), Consumer::new(ring))
    }

    // ---------------------------------------------------------------------
    // CONSTANTS & STATUS
    // ---------------------------------------------------------------------

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Returns the configuration the ring was built with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current number of items in the ring.
    ///
    /// Exact when neither side is running; otherwise a snapshot that may be
    /// stale by the time it is returned. Use for monitoring, not control.
    #[inline]
    pub fn len(&self) -> usize {
        // tail first: its Acquire orders the head load after every head value
        // the consumer had observed, so head - tail cannot underflow.
        let tail = self.consumer.tail.load(Ordering::Acquire);
        let head = self.producer.head.load(Ordering::Acquire);
        (head.wrapping_sub(tail) as usize).min(self.capacity())
    }

    /// Returns true if the ring is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the ring is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            metrics::snapshot(&self.producer.metrics, &self.consumer.metrics)
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Producer's own cursor. Relaxed: the caller is the only writer.
    #[inline]
    pub(crate) fn head_position(&self) -> u64 {
        self.producer.head.load(Ordering::Relaxed)
    }

    /// Consumer's own cursor. Relaxed: the caller is the only writer.
    #[inline]
    pub(crate) fn tail_position(&self) -> u64 {
        self.consumer.tail.load(Ordering::Relaxed)
    }

    /// Producer's last observed `tail`. Only the producer may call this.
    #[inline]
    fn cached_tail(&self) -> u64 {
        // SAFETY: cached_tail is only accessed from the producer side.
        self.producer.cached_tail.with(|ptr| unsafe { *ptr })
    }

    /// Consumer's last observed `head`. Only the consumer may call this.
    #[inline]
    fn cached_head(&self) -> u64 {
        // SAFETY: cached_head is only accessed from the consumer side.
        self.consumer.cached_head.with(|ptr| unsafe { *ptr })
    }

    #[inline]
    fn slot(&self, seq: u64) -> &Slot<T> {
        &self.slots[(seq as usize) & self.mask]
    }

    // ---------------------------------------------------------------------
    // PRODUCER SIDE
    // ---------------------------------------------------------------------

    /// Free slots as seen by the producer at `head`.
    ///
    /// Fast path trusts `cached_tail`; the `tail` Acquire load only happens
    /// when the cache shows fewer than `wanted` free slots.
    ///
    /// # Safety
    ///
    /// Caller must be the single producer.
    #[inline]
    unsafe fn free_slots(&self, head: u64, wanted: usize) -> usize {
        let capacity = self.capacity() as u64;

        let cached_tail = self.cached_tail();
        let free = capacity.saturating_sub(head.wrapping_sub(cached_tail));
        if free >= wanted as u64 {
            return free as usize;
        }

        let tail = self.consumer.tail.load(Ordering::Acquire);
        // SAFETY: as above; the Acquire load pairs with the consumer's
        // Release store of `tail`, so slots below it are no longer read.
        self.producer.cached_tail.with_mut(|ptr| unsafe { *ptr = tail });
        capacity.saturating_sub(head.wrapping_sub(tail)) as usize
    }

    /// Publishes `n` freshly written slots starting at `head`.
    #[inline]
    fn publish_head(&self, head: u64, n: usize) {
        let new_head = head.wrapping_add(n as u64);

        debug_assert_monotonic!("head", head, new_head);
        // cached_tail <= tail, so this bound is at least as strict as the real one.
        debug_assert_bounded_count!(
            new_head.wrapping_sub(self.cached_tail()) as usize,
            self.capacity()
        );

        self.producer.head.store(new_head, Ordering::Release);

        if self.config.enable_metrics {
            self.producer.metrics.record_enqueued(n as u64);
        }
    }

    /// Enqueue one value, handing it back if the ring is full.
    ///
    /// # Safety
    ///
    /// Caller must be the single producer (guaranteed by [`Producer`]).
    #[inline]
    pub(crate) unsafe fn push(&self, value: T) -> Result<(), T> {
        let head = self.producer.head.load(Ordering::Relaxed);

        if self.free_slots(head, 1) == 0 {
            if self.config.enable_metrics {
                self.producer.metrics.record_full();
            }
            return Err(value);
        }

        // SAFETY: head - tail < capacity, so the consumer is not reading this
        // slot and will not until the Release store in publish_head.
        self.slot(head).with_mut(|slot| unsafe {
            (*slot).write(value);
        });
        self.publish_head(head, 1);
        Ok(())
    }

    /// Clone as many leading `items` as fit and publish them with one store.
    ///
    /// # Safety
    ///
    /// Caller must be the single producer.
    pub(crate) unsafe fn push_slice(&self, items: &[T]) -> usize
    where
        T: Clone,
    {
        if items.is_empty() {
            return 0;
        }

        let head = self.producer.head.load(Ordering::Relaxed);
        let n = self.free_slots(head, items.len()).min(items.len());
        if n == 0 {
            if self.config.enable_metrics {
                self.producer.metrics.record_full();
            }
            return 0;
        }

        for (offset, item) in items[..n].iter().enumerate() {
            // SAFETY: every seq in [head, head + n) is a free slot (see push).
            // A panicking clone leaves earlier writes unpublished: leaked, not
            // exposed to the consumer.
            self.slot(head.wrapping_add(offset as u64))
                .with_mut(|slot| unsafe {
                    (*slot).write(item.clone());
                });
        }
        self.publish_head(head, n);
        n
    }

    // ---------------------------------------------------------------------
    // CONSUMER SIDE
    // ---------------------------------------------------------------------

    /// Head as seen by the consumer at `tail`; refreshed with an Acquire load
    /// only when the cache shows fewer than `wanted` readable slots.
    ///
    /// # Safety
    ///
    /// Caller must be the single consumer.
    #[inline]
    unsafe fn readable_head(&self, tail: u64, wanted: usize) -> u64 {
        let cached_head = self.cached_head();
        if cached_head.wrapping_sub(tail) >= wanted as u64 {
            return cached_head;
        }

        let head = self.producer.head.load(Ordering::Acquire);
        // SAFETY: as above; the Acquire load pairs with the producer's
        // Release store of `head`, making slots below it readable.
        self.consumer.cached_head.with_mut(|ptr| unsafe { *ptr = head });
        head
    }

    /// Moves the value at `seq` out of its slot.
    ///
    /// # Safety
    ///
    /// Caller must be the single consumer, with `tail <= seq < head` where
    /// `head` came from `readable_head`. The slot must be released afterwards
    /// (via `publish_tail`) and not read again.
    #[inline]
    unsafe fn take(&self, seq: u64, tail: u64, head: u64) -> T {
        debug_assert_initialized_read!(seq, tail, head);
        // SAFETY: the producer initialized this slot before publishing `head`.
        self.slot(seq).with(|slot| unsafe { (*slot).assume_init_read() })
    }

    /// Hands `n` consumed slots starting at `tail` back to the producer.
    #[inline]
    fn publish_tail(&self, tail: u64, n: usize) {
        let new_tail = tail.wrapping_add(n as u64);

        debug_assert_monotonic!("tail", tail, new_tail);
        debug_assert_tail_not_past_head!(new_tail, self.cached_head());

        self.consumer.tail.store(new_tail, Ordering::Release);

        if self.config.enable_metrics {
            self.consumer.metrics.record_dequeued(n as u64);
        }
    }

    /// Dequeue one value, `None` if the ring is empty.
    ///
    /// # Safety
    ///
    /// Caller must be the single consumer (guaranteed by [`Consumer`]).
    #[inline]
    pub(crate) unsafe fn pop(&self) -> Option<T> {
        let tail = self.consumer.tail.load(Ordering::Relaxed);
        let head = self.readable_head(tail, 1);
        if head == tail {
            if self.config.enable_metrics {
                self.consumer.metrics.record_empty();
            }
            return None;
        }

        let value = self.take(tail, tail, head);
        self.publish_tail(tail, 1);
        Some(value)
    }

    /// Borrow the front value without consuming it.
    ///
    /// # Safety
    ///
    /// Caller must be the single consumer and must not advance `tail` while
    /// the returned reference is alive.
    #[inline]
    pub(crate) unsafe fn peek(&self) -> Option<&T> {
        let tail = self.consumer.tail.load(Ordering::Relaxed);
        let head = self.readable_head(tail, 1);
        if head == tail {
            return None;
        }

        debug_assert_initialized_read!(tail, tail, head);
        // SAFETY: slot is initialized (see take) and the producer cannot
        // reuse it until tail moves past it.
        let ptr = self.slot(tail).with(|slot| unsafe { (*slot).as_ptr() });
        Some(unsafe { &*ptr })
    }

    /// Move up to `max_items` values into `handler`, releasing their slots
    /// with a single `tail` store.
    ///
    /// # Safety
    ///
    /// Caller must be the single consumer.
    pub(crate) unsafe fn consume_up_to<F>(&self, max_items: usize, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        if max_items == 0 {
            return 0;
        }

        let tail = self.consumer.tail.load(Ordering::Relaxed);
        let head = self.readable_head(tail, max_items);
        let count = (head.wrapping_sub(tail) as usize).min(max_items);
        if count == 0 {
            if self.config.enable_metrics {
                self.consumer.metrics.record_empty();
            }
            return 0;
        }

        // If the handler panics, the guard still releases every slot whose
        // value was already moved out, so the ring's Drop never sees them.
        let mut release = TailRelease {
            ring: self,
            start: tail,
            pos: tail,
        };
        let end = tail.wrapping_add(count as u64);
        while release.pos != end {
            let value = self.take(release.pos, tail, head);
            release.pos = release.pos.wrapping_add(1);
            handler(value);
        }

        count
    }
}

/// Publishes consumer progress once, on scope exit or unwind.
struct TailRelease<'a, T> {
    ring: &'a BoundedSpscRing<T>,
    start: u64,
    pos: u64,
}

impl<T> Drop for TailRelease<'_, T> {
    fn drop(&mut self) {
        let n = self.pos.wrapping_sub(self.start) as usize;
        if n > 0 {
            self.ring.publish_tail(self.start, n);
        }
    }
}

impl<T> Drop for BoundedSpscRing<T> {
    fn drop(&mut self) {
        // &mut self: both handles are gone, plain loads are enough.
        let tail = self.consumer.tail.load(Ordering::Relaxed);
        let head = self.producer.head.load(Ordering::Relaxed);

        if head != tail {
            tracing::trace!(residual = head.wrapping_sub(tail), "dropping items left in spsc ring");
        }

        if mem::needs_drop::<T>() {
            let mut seq = tail;
            while seq != head {
                // SAFETY: slots in [tail, head) hold initialized values that
                // nobody consumed; each is dropped exactly once here.
                self.slot(seq).with_mut(|slot| unsafe { (*slot).assume_init_drop() });
                seq = seq.wrapping_add(1);
            }
        }
    }
}

impl<T> fmt::Debug for BoundedSpscRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedSpscRing")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("metrics", &self.config.enable_metrics)
            .finish()
    }
}
