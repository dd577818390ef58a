//! Producer and consumer handles.
//!
//! A [`BoundedSpscRing`] is only ever driven through these two handles. There
//! is exactly one of each per [`split`](BoundedSpscRing::split), neither is
//! `Clone`, and every mutating method takes `&mut self`, which is what turns
//! the ring's single-producer / single-consumer contract into something the
//! compiler checks.

use crate::BoundedSpscRing;
use std::fmt;

/// The enqueue side of a [`BoundedSpscRing`].
///
/// `Send` when `T: Send`, so it can be moved to the producer thread.
pub struct Producer<'a, T> {
    ring: &'a BoundedSpscRing<T>,
}

impl<'a, T> Producer<'a, T> {
    pub(crate) fn new(ring: &'a BoundedSpscRing<T>) -> Self {
        Self { ring }
    }

    /// Enqueue a value. Returns `false` (and drops `value`) if the ring is full.
    ///
    /// Never blocks or retries; backpressure is up to the caller.
    ///
    /// # Example
    /// ```
    /// # let mut ring = ringspsc_rs::BoundedSpscRing::<u64>::new(2)?;
    /// # let (mut producer, _consumer) = ring.split();
    /// assert!(producer.try_enqueue(1));
    /// assert!(producer.try_enqueue(2));
    /// assert!(!producer.try_enqueue(3)); // full
    /// # Ok::<(), ringspsc_rs::ConfigError>(())
    /// ```
    #[inline]
    pub fn try_enqueue(&mut self, value: T) -> bool {
        self.try_push(value).is_ok()
    }

    /// Enqueue a value, giving it back as `Err(value)` if the ring is full.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        // SAFETY: split() creates one Producer per &mut borrow of the ring and
        // &mut self serializes calls on it.
        unsafe { self.ring.push(value) }
    }

    /// Batch enqueue (convenience).
    ///
    /// Clones the longest prefix of `items` that fits and publishes it with a
    /// single cursor store. Returns how many were enqueued (0 if full).
    pub fn push_slice(&mut self, items: &[T]) -> usize
    where
        T: Clone,
    {
        // SAFETY: see try_push.
        unsafe { self.ring.push_slice(items) }
    }

    /// Total number of values this ring has ever accepted.
    ///
    /// Exact from the producer's point of view and never decreases.
    #[inline]
    pub fn position(&self) -> u64 {
        self.ring.head_position()
    }

    /// See [`BoundedSpscRing::len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// See [`BoundedSpscRing::is_empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// See [`BoundedSpscRing::is_full`].
    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// The ring this handle feeds.
    pub fn ring(&self) -> &'a BoundedSpscRing<T> {
        self.ring
    }
}

impl<T> fmt::Debug for Producer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("position", &self.position())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// The dequeue side of a [`BoundedSpscRing`].
///
/// `Send` when `T: Send`, so it can be moved to the consumer thread.
pub struct Consumer<'a, T> {
    ring: &'a BoundedSpscRing<T>,
}

impl<'a, T> Consumer<'a, T> {
    pub(crate) fn new(ring: &'a BoundedSpscRing<T>) -> Self {
        Self { ring }
    }

    /// Dequeue the oldest value, or `None` if the ring is empty.
    #[inline]
    pub fn try_dequeue(&mut self) -> Option<T> {
        // SAFETY: split() creates one Consumer per &mut borrow of the ring and
        // &mut self serializes calls on it.
        unsafe { self.ring.pop() }
    }

    /// Borrow the oldest value without removing it.
    ///
    /// Takes `&mut self` so the value cannot be dequeued while borrowed.
    #[inline]
    pub fn peek(&mut self) -> Option<&T> {
        // SAFETY: see try_dequeue; the returned borrow of self blocks any
        // tail advance for its lifetime.
        unsafe { self.ring.peek() }
    }

    /// Process ALL available items with a single tail update.
    ///
    /// The handler receives ownership of each item. Returns the number of
    /// items consumed (0 if the ring was empty).
    ///
    /// # Example
    /// ```
    /// # let mut ring = ringspsc_rs::BoundedSpscRing::<String>::new(4)?;
    /// # let (mut producer, mut consumer) = ring.split();
    /// # producer.try_enqueue("a".to_string());
    /// let mut batch = Vec::new();
    /// consumer.consume_batch(|item| batch.push(item));
    /// # assert_eq!(batch, ["a"]);
    /// # Ok::<(), ringspsc_rs::ConfigError>(())
    /// ```
    pub fn consume_batch<F>(&mut self, handler: F) -> usize
    where
        F: FnMut(T),
    {
        self.consume_up_to(usize::MAX, handler)
    }

    /// Consume up to `max_items` with a single tail update.
    ///
    /// Useful when a large backlog would otherwise stall the consumer loop.
    /// If `handler` panics, items already handed out stay consumed.
    pub fn consume_up_to<F>(&mut self, max_items: usize, handler: F) -> usize
    where
        F: FnMut(T),
    {
        // SAFETY: see try_dequeue.
        unsafe { self.ring.consume_up_to(max_items, handler) }
    }

    /// Total number of values ever dequeued from this ring.
    ///
    /// Exact from the consumer's point of view and never decreases.
    #[inline]
    pub fn position(&self) -> u64 {
        self.ring.tail_position()
    }

    /// See [`BoundedSpscRing::len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// See [`BoundedSpscRing::is_empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// See [`BoundedSpscRing::is_full`].
    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// The ring this handle drains.
    pub fn ring(&self) -> &'a BoundedSpscRing<T> {
        self.ring
    }
}

impl<T> fmt::Debug for Consumer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("position", &self.position())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_handles_are_send() {
        assert_send::<Producer<'static, String>>();
        assert_send::<Consumer<'static, String>>();
    }

    #[test]
    fn test_positions_track_cursors() {
        let mut ring = BoundedSpscRing::<u8>::new(4).unwrap();
        let (mut producer, mut consumer) = ring.split();

        assert_eq!(producer.position(), 0);
        assert_eq!(producer.push_slice(&[1, 2, 3]), 3);
        assert_eq!(producer.position(), 3);

        assert_eq!(consumer.try_dequeue(), Some(1));
        assert_eq!(consumer.position(), 1);
        assert_eq!(consumer.peek(), Some(&2));
        assert_eq!(consumer.position(), 1);
        assert_eq!(consumer.len(), 2);
    }

    #[test]
    fn test_debug_output() {
        let mut ring = BoundedSpscRing::<u8>::new(4).unwrap();
        let (producer, consumer) = ring.split();
        assert!(format!("{producer:?}").contains("capacity: 4"));
        assert!(format!("{consumer:?}").contains("position: 0"));
    }
}
