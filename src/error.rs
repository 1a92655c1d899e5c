//! Error types.
//!
//! Raw byte transfers never fail; they clamp to what fits. Only construction and
//! the all-or-nothing record operations report errors.

use thiserror::Error;

/// Failure to set up backing storage for a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// Attached storage length is zero or not a power of two.
    #[error("capacity {capacity} is not a non-zero power of two")]
    InvalidCapacity { capacity: usize },
    /// Requested capacity exceeds what the `u32` cursors can address.
    #[error("capacity {capacity} exceeds the maximum of {max} bytes")]
    CapacityTooLarge { capacity: usize, max: usize },
    /// The allocator could not provide the backing buffer.
    #[error("failed to allocate {capacity} bytes of ring storage")]
    AllocFailed { capacity: usize },
}

/// Rejection of a framed record. The ring is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Payload length cannot be encoded in the chosen prefix width.
    #[error("record of {len} bytes exceeds the prefix limit of {max}")]
    TooLong { len: usize, max: usize },
    /// Not enough free space for prefix plus payload.
    #[error("record needs {needed} bytes but only {available} are free")]
    WouldNotFit { needed: usize, available: usize },
    /// Not enough stored bytes to satisfy the read.
    #[error("record read needs {needed} bytes but only {occupied} are stored")]
    Underrun { needed: usize, occupied: usize },
    /// Destination is shorter than the stored record.
    #[error("record of {needed} bytes does not fit a {got} byte buffer")]
    BufferTooSmall { needed: usize, got: usize },
}
