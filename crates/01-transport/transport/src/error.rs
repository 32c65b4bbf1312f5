//! Error handling helpers for the transport crate.
//!
//! The error surface stays small: capacity validation and slot-discipline
//! violations. Higher layers wrap these in their own error types.

use std::fmt;

use crate::slot_pool::SlotState;

/// Convenience result alias for fallible transport operations.
pub type TransportResult<T, E = TransportError> = Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors surfaced by low-level transport helpers.
pub enum TransportError {
    /// Requested slot count is outside the supported range.
    InvalidCapacity { requested: usize, minimum: usize, maximum: usize },
    /// Slot index does not belong to the pool.
    SlotOutOfRange { idx: u32, slot_count: u32 },
    /// Slot is not in the state the operation requires.
    WrongState {
        idx: u32,
        expected: SlotState,
        found: SlotState,
    },
    /// Lease generation no longer matches the slot; the slot was recycled.
    StaleLease { idx: u32, lease: u64, current: u64 },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidCapacity {
                requested,
                minimum,
                maximum,
            } => {
                write!(
                    f,
                    "slot count {requested} must be between {minimum} and {maximum}"
                )
            }
            TransportError::SlotOutOfRange { idx, slot_count } => {
                write!(f, "slot {idx} out of range (pool has {slot_count} slots)")
            }
            TransportError::WrongState {
                idx,
                expected,
                found,
            } => {
                write!(f, "slot {idx} is {found:?}, expected {expected:?}")
            }
            TransportError::StaleLease {
                idx,
                lease,
                current,
            } => {
                write!(
                    f,
                    "lease generation {lease} for slot {idx} is stale (slot is at {current})"
                )
            }
        }
    }
}

impl std::error::Error for TransportError {}
