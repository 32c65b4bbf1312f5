use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use transport::{SlotLease, SlotPool, SlotPoolConfig, TransportError};
use xr_abi::{ProjectionParams, StereoUniforms, ViewerPose};

use crate::compose::stereo_uniforms;
use crate::error::{SyncError, SyncResult};

/// Smallest ring the synchronizer accepts (double buffering).
pub const MIN_RING_SIZE: u32 = 2;
/// Largest ring the synchronizer accepts.
pub const MAX_RING_SIZE: u32 = 8;
/// Triple buffering.
pub const DEFAULT_RING_SIZE: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Number of uniform slots that may be in flight at once.
    pub ring_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> SyncResult<()> {
        if (MIN_RING_SIZE..=MAX_RING_SIZE).contains(&self.ring_size) {
            Ok(())
        } else {
            Err(SyncError::InvalidConfig(TransportError::InvalidCapacity {
                requested: self.ring_size as usize,
                minimum: MIN_RING_SIZE as usize,
                maximum: MAX_RING_SIZE as usize,
            }))
        }
    }
}

/// Token for one frame's uniform slot.
///
/// Handles are plain values; the synchronizer checks the slot's state and
/// generation on every use, so a handle kept past `release` is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameSlotHandle {
    slot: u32,
    frame_id: u64,
}

impl FrameSlotHandle {
    /// Ring slot backing this frame.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Monotonic frame number assigned by `begin_frame`.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    fn lease(self) -> SlotLease {
        SlotLease {
            idx: self.slot,
            generation: self.frame_id,
        }
    }

    fn from_lease(lease: SlotLease) -> Self {
        Self {
            slot: lease.idx,
            frame_id: lease.generation,
        }
    }
}

/// Immutable copy of a published frame's uniforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub frame_id: u64,
    pub slot: u32,
    pub uniforms: StereoUniforms,
}

impl FrameSnapshot {
    /// Handle the consumer passes back to `release`.
    pub fn handle(&self) -> FrameSlotHandle {
        FrameSlotHandle {
            slot: self.slot,
            frame_id: self.frame_id,
        }
    }
}

/// Counters exposed for health reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub begun: u64,
    pub published: u64,
    pub released: u64,
    pub discarded: u64,
    pub exhausted: u64,
}

#[derive(Default)]
struct SyncCounters {
    begun: AtomicU64,
    published: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
    exhausted: AtomicU64,
}

impl SyncCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SyncStats {
        SyncStats {
            begun: self.begun.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Produces the stereo uniforms for each frame and tracks slot ownership.
pub struct FrameUniformSynchronizer {
    ring: Mutex<SlotPool<StereoUniforms>>,
    current: ArcSwapOption<FrameSnapshot>,
    counters: SyncCounters,
    ring_size: u32,
}

impl FrameUniformSynchronizer {
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        let ring = SlotPool::new(SlotPoolConfig {
            slot_count: config.ring_size,
        })
        .map_err(SyncError::InvalidConfig)?;
        Ok(Self {
            ring: Mutex::new(ring),
            current: ArcSwapOption::empty(),
            counters: SyncCounters::default(),
            ring_size: config.ring_size,
        })
    }

    /// Computes both eye packs and writes them into the next free slot.
    ///
    /// Invalid inputs are rejected before a slot is taken. When no slot is
    /// free the consumer is more than `ring_size` frames behind and the call
    /// fails with [`SyncError::SlotExhausted`].
    pub fn begin_frame(
        &self,
        pose: &ViewerPose,
        params: &ProjectionParams,
    ) -> SyncResult<FrameSlotHandle> {
        let uniforms = stereo_uniforms(pose, params)?;

        let mut ring = self.ring.lock();
        let Some(lease) = ring.try_acquire() else {
            SyncCounters::bump(&self.counters.exhausted);
            warn!(
                "uniform ring exhausted: {} slots in flight",
                self.ring_size
            );
            return Err(SyncError::SlotExhausted {
                ring_size: self.ring_size,
            });
        };
        let handle = FrameSlotHandle::from_lease(lease);
        *ring.slot_mut(lease).map_err(|source| SyncError::InvalidHandle { handle, source })? =
            uniforms;
        SyncCounters::bump(&self.counters.begun);
        trace!("frame {} writing slot {}", handle.frame_id, handle.slot);
        Ok(handle)
    }

    /// Freezes the slot and makes it the current snapshot.
    ///
    /// Publishing a frame older than the current one fails with
    /// [`SyncError::StaleFrame`] and leaves the slot in the writing state; the
    /// caller should [`discard`](Self::discard) it.
    pub fn publish(&self, handle: FrameSlotHandle) -> SyncResult<Arc<FrameSnapshot>> {
        let mut ring = self.ring.lock();
        if let Some(current) = self.current.load().as_deref() {
            if current.frame_id > handle.frame_id {
                return Err(SyncError::StaleFrame {
                    frame_id: handle.frame_id,
                    current: current.frame_id,
                });
            }
        }
        let uniforms = *ring
            .publish(handle.lease())
            .map_err(|source| SyncError::InvalidHandle { handle, source })?;
        let snapshot = Arc::new(FrameSnapshot {
            frame_id: handle.frame_id,
            slot: handle.slot,
            uniforms,
        });
        // Store while the ring lock is held so concurrent publishers cannot
        // reorder the current snapshot.
        self.current.store(Some(Arc::clone(&snapshot)));
        drop(ring);

        SyncCounters::bump(&self.counters.published);
        debug!("frame {} published from slot {}", handle.frame_id, handle.slot);
        Ok(snapshot)
    }

    /// Returns a published slot once the consumer finished reading it.
    pub fn release(&self, handle: FrameSlotHandle) -> SyncResult<()> {
        self.ring
            .lock()
            .release(handle.lease())
            .map_err(|source| SyncError::InvalidHandle { handle, source })?;
        SyncCounters::bump(&self.counters.released);
        trace!("frame {} released slot {}", handle.frame_id, handle.slot);
        Ok(())
    }

    /// Gives back a slot that was begun but will never be published.
    pub fn discard(&self, handle: FrameSlotHandle) -> SyncResult<()> {
        self.ring
            .lock()
            .abandon(handle.lease())
            .map_err(|source| SyncError::InvalidHandle { handle, source })?;
        SyncCounters::bump(&self.counters.discarded);
        debug!("frame {} discarded before publish", handle.frame_id);
        Ok(())
    }

    /// Uniforms of the latest published frame, or `None` before the first publish.
    ///
    /// Lock-free; never observes a slot that is still being written.
    pub fn current(&self) -> Option<StereoUniforms> {
        self.current.load().as_ref().map(|snapshot| snapshot.uniforms)
    }

    /// Latest published frame including its id and slot.
    pub fn current_frame(&self) -> Option<Arc<FrameSnapshot>> {
        self.current.load_full()
    }

    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    /// Slots currently being written or held by the consumer.
    pub fn in_flight(&self) -> u32 {
        self.ring.lock().in_use()
    }

    pub fn free_slots(&self) -> u32 {
        self.ring.lock().free_len()
    }

    pub fn stats(&self) -> SyncStats {
        self.counters.snapshot()
    }
}

impl std::fmt::Debug for FrameUniformSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameUniformSynchronizer")
            .field("ring_size", &self.ring_size)
            .field("in_flight", &self.in_flight())
            .field("current", &self.current.load().as_ref().map(|s| s.frame_id))
            .finish()
    }
}
