use crate::ConfigError;

/// Largest accepted ring capacity (2^31 slots).
///
/// Keeps `head - tail` far away from the `u64` sequence space so the
/// wrapping arithmetic on cursors is never exercised in practice.
pub const MAX_CAPACITY: usize = 1 << 31;

/// Configuration for [`BoundedSpscRing`](crate::BoundedSpscRing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of slots. Must be a power of two (default: 1024)
    pub capacity: usize,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    ///
    /// The capacity is not checked here; [`validate`](Self::validate) runs when
    /// the ring is built.
    pub const fn new(capacity: usize, enable_metrics: bool) -> Self {
        Self {
            capacity,
            enable_metrics,
        }
    }

    /// Creates a configuration with `2^ring_bits` slots.
    pub const fn from_bits(ring_bits: u8, enable_metrics: bool) -> Self {
        let capacity = match 1usize.checked_shl(ring_bits as u32) {
            Some(capacity) => capacity,
            None => usize::MAX,
        };
        Self::new(capacity, enable_metrics)
    }

    /// Returns a copy with metrics switched on or off.
    pub const fn with_metrics(mut self, enable_metrics: bool) -> Self {
        self.enable_metrics = enable_metrics;
        self
    }

    /// Returns the capacity of the ring buffer.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity.wrapping_sub(1)
    }

    /// Checks that the capacity is a positive power of two within `MAX_CAPACITY`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.capacity;
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if capacity > MAX_CAPACITY {
            return Err(ConfigError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            });
        }
        if !capacity.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { capacity });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1024,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (4K slots, fits in L1 cache for small `T`)
pub const LOW_LATENCY_CONFIG: Config = Config::from_bits(12, false);

/// High throughput configuration (256K slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::from_bits(18, false);
