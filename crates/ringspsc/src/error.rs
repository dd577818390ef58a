//! Error types for ring construction.
//!
//! Full and empty rings are not errors: `try_enqueue` and `try_dequeue`
//! report them through `bool` / `Option`. The only failure a caller can
//! observe is a bad configuration, rejected before any memory is allocated.

use thiserror::Error;

/// Invalid ring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Capacity was zero.
    #[error("ring capacity must be greater than zero")]
    ZeroCapacity,

    /// Capacity was not a power of two, so `seq & mask` would not wrap correctly.
    #[error("ring capacity {capacity} is not a power of two")]
    NotPowerOfTwo {
        /// The rejected capacity.
        capacity: usize,
    },

    /// Capacity exceeds the largest supported ring.
    #[error("ring capacity {capacity} exceeds maximum {max}")]
    CapacityTooLarge {
        /// The rejected capacity.
        capacity: usize,
        /// The configured maximum (`MAX_CAPACITY`).
        max: usize,
    },
}

impl ConfigError {
    /// Returns the capacity that was rejected.
    pub fn capacity(&self) -> usize {
        match self {
            Self::ZeroCapacity => 0,
            Self::NotPowerOfTwo { capacity } | Self::CapacityTooLarge { capacity, .. } => *capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::ZeroCapacity.to_string(),
            "ring capacity must be greater than zero"
        );
        assert_eq!(
            ConfigError::NotPowerOfTwo { capacity: 6 }.to_string(),
            "ring capacity 6 is not a power of two"
        );
        assert_eq!(ConfigError::NotPowerOfTwo { capacity: 6 }.capacity(), 6);
        assert_eq!(ConfigError::ZeroCapacity.capacity(), 0);
    }
}
