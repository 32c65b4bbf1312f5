//! Frame uniform synchronizer: stereo eye transforms handed to the renderer
//! through a small ring of slots.
//!
//! The synchronizer owns every slot while it is written. Publishing freezes a
//! slot and swaps it in as the current snapshot; the render consumer gives the
//! slot back with [`FrameUniformSynchronizer::release`] once the GPU is done
//! with it. When every slot is out, [`FrameUniformSynchronizer::begin_frame`]
//! fails with [`SyncError::SlotExhausted`] instead of waiting.

mod compose;
mod error;
mod synchronizer;

pub use compose::stereo_uniforms;
pub use error::{SyncError, SyncResult};
pub use synchronizer::{
    FrameSlotHandle, FrameSnapshot, FrameUniformSynchronizer, SyncConfig, SyncStats,
    DEFAULT_RING_SIZE, MAX_RING_SIZE, MIN_RING_SIZE,
};
