use std::hint;
use std::thread;

/// Caller-side retry pacing for a full or empty ring.
///
/// The ring never waits on its own; producers and consumers that want to
/// retry wrap their `try_*` calls with this. Each [`snooze`](Self::snooze)
/// doubles the PAUSE-hint spin count up to `2^spin_limit`, then switches to
/// `yield_now`, and after `yield_limit` steps reports
/// [`is_completed`](Self::is_completed) so the caller can fall back to its own
/// policy (sleep, drop, deadline check).
#[derive(Debug, Clone)]
pub struct Backoff {
    step: u32,
    spin_limit: u32,
    yield_limit: u32,
}

impl Backoff {
    /// 2^6 = 64 spins max before yielding
    pub const DEFAULT_SPIN_LIMIT: u32 = 6;
    /// Then give up
    pub const DEFAULT_YIELD_LIMIT: u32 = 10;

    /// Creates a backoff with the default limits.
    #[inline]
    pub fn new() -> Self {
        Self::with_limits(Self::DEFAULT_SPIN_LIMIT, Self::DEFAULT_YIELD_LIMIT)
    }

    /// Creates a backoff with custom limits. `spin_limit` is capped at 31 and
    /// `yield_limit` is raised to at least `spin_limit`.
    #[inline]
    pub fn with_limits(spin_limit: u32, yield_limit: u32) -> Self {
        let spin_limit = spin_limit.min(31);
        Self {
            step: 0,
            spin_limit,
            yield_limit: yield_limit.max(spin_limit),
        }
    }

    /// Spin only; never yields to the OS.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..1u32 << self.step.min(self.spin_limit) {
            hint::spin_loop();
        }
        if self.step <= self.spin_limit {
            self.step += 1;
        }
    }

    /// Spin while within the spin limit, then yield.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= self.spin_limit {
            self.spin();
            return;
        }
        thread::yield_now();
        if self.step <= self.yield_limit {
            self.step += 1;
        }
    }

    /// True once the yield phase is exhausted.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > self.yield_limit
    }

    /// Reset after a successful operation.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Retries `op` with backoff until it yields a value or the backoff
    /// completes.
    pub fn retry<R>(&mut self, mut op: impl FnMut() -> Option<R>) -> Option<R> {
        loop {
            if let Some(value) = op() {
                self.reset();
                return Some(value);
            }
            if self.is_completed() {
                return None;
            }
            self.snooze();
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
