//! Debug assertion macros for the ring's cursor invariants.
//!
//! Active only in debug builds (`debug_assert!`), so release builds pay
//! nothing. The ring keeps two unbounded `u64` cursors:
//!
//! - `head`: elements ever enqueued (producer-written)
//! - `tail`: elements ever dequeued (consumer-written)
//!
//! and every state must satisfy `tail <= head <= tail + capacity`.

// =============================================================================
// Bounded count
// =============================================================================

/// Assert that the number of occupied slots does not exceed capacity.
///
/// **Invariant**: `0 <= head - tail <= capacity`
///
/// Used in: `publish_head()` before storing the new head
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded count violated: {} occupied slots exceed capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that the consumer never moves `tail` past `head`.
///
/// **Invariant**: `tail <= head` (after the consumer publishes)
///
/// Used in: `publish_tail()` before storing the new tail
macro_rules! debug_assert_tail_not_past_head {
    ($new_tail:expr, $head:expr) => {
        debug_assert!(
            $new_tail <= $head,
            "cursor order violated: advancing tail {} beyond head {}",
            $new_tail,
            $head
        )
    };
}

// =============================================================================
// Monotonic progress
// =============================================================================

/// Assert that a cursor only moves forward.
///
/// **Invariant**: `new >= old` for both `head` and `tail`
///
/// Used in: `publish_head()`, `publish_tail()`
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "monotonic progress violated: {} moved from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// Initialized range
// =============================================================================

/// Assert that the consumer reads a slot the producer has published.
///
/// **Invariant**: `slot(seq) is initialized <=> tail <= seq < head`
///
/// Used before every `assume_init_read()` / `assume_init_ref()`.
macro_rules! debug_assert_initialized_read {
    ($seq:expr, $tail:expr, $head:expr) => {
        debug_assert!(
            $seq >= $tail && $seq < $head,
            "initialized read violated: slot seq {} outside published range [{}, {})",
            $seq,
            $tail,
            $head
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_initialized_read;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_tail_not_past_head;
