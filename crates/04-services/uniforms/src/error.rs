use thiserror::Error;

use transport::TransportError;
use xr_abi::Eye;

use crate::synchronizer::FrameSlotHandle;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Every ring slot is being written or still held by the consumer.
    #[error("all {ring_size} uniform slots are in flight; render consumer is stalled")]
    SlotExhausted { ring_size: u32 },

    #[error("projection for {eye:?} eye is singular or not finite")]
    InvalidProjection { eye: Eye },

    #[error("viewer pose is singular or not finite")]
    InvalidPose,

    #[error("invalid frame handle {handle:?}: {source}")]
    InvalidHandle {
        handle: FrameSlotHandle,
        #[source]
        source: TransportError,
    },

    /// A newer frame is already current.
    #[error("frame {frame_id} is older than current frame {current}")]
    StaleFrame { frame_id: u64, current: u64 },

    #[error("invalid synchronizer configuration: {0}")]
    InvalidConfig(#[source] TransportError),
}

impl SyncError {
    /// Whether this error means the render consumer stopped returning slots.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, SyncError::SlotExhausted { .. })
    }
}
