use std::sync::Arc;

use log::{debug, trace, warn};
use smallvec::SmallVec;
use xr_abi::{ImmersiveSpaceState, LayerState};
use xr_spatial::SpatialEventRouter;
use xr_uniforms::{FrameSlotHandle, FrameSnapshot, FrameUniformSynchronizer, SyncError};

use crate::collaborator::{FrameInputs, PresentStatus, RenderCollaborator, TrackingSample};
use crate::config::FrameLoopConfig;
use crate::error::{LoopError, LoopResult};
use crate::health::FrameHealth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    Idle,
    TrackingReady,
    FrameActive,
    Published,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Presented { frame_id: u64, events: usize },
    /// The cycle was aborted; the loop is back to `Idle`.
    Dropped { error: SyncError },
    /// The immersive space is not open; nothing was touched.
    Skipped { space: ImmersiveSpaceState },
}

/// Drives one compositor frame at a time through tracking, uniform
/// composition and presentation.
pub struct FrameLoop<R> {
    config: FrameLoopConfig,
    sync: Arc<FrameUniformSynchronizer>,
    router: Arc<SpatialEventRouter>,
    renderer: R,
    phase: FramePhase,
    space: ImmersiveSpaceState,
    health: FrameHealth,
    tracking: Option<TrackingSample>,
    active: Option<FrameSlotHandle>,
    published: Option<Arc<FrameSnapshot>>,
    in_flight: SmallVec<[Arc<FrameSnapshot>; 4]>,
}

impl<R: RenderCollaborator> FrameLoop<R> {
    pub fn new(config: FrameLoopConfig, renderer: R) -> LoopResult<Self> {
        config.validate()?;
        let sync = FrameUniformSynchronizer::new(config.sync_config())?;
        let router = SpatialEventRouter::new(config.router_config());
        Ok(Self {
            config,
            sync: Arc::new(sync),
            router: Arc::new(router),
            renderer,
            phase: FramePhase::Idle,
            space: ImmersiveSpaceState::default(),
            health: FrameHealth::default(),
            tracking: None,
            active: None,
            published: None,
            in_flight: SmallVec::new(),
        })
    }

    pub fn config(&self) -> &FrameLoopConfig {
        &self.config
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn space(&self) -> ImmersiveSpaceState {
        self.space
    }

    pub fn health(&self) -> FrameHealth {
        self.health
    }

    pub fn synchronizer(&self) -> &Arc<FrameUniformSynchronizer> {
        &self.sync
    }

    pub fn router(&self) -> &Arc<SpatialEventRouter> {
        &self.router
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Tracking taken for the frame in progress; `None` while idle.
    pub fn tracking(&self) -> Option<&TrackingSample> {
        self.tracking.as_ref()
    }

    /// Snapshots presented but not yet reported complete.
    pub fn in_flight_frames(&self) -> usize {
        self.in_flight.len()
    }

    /// Applies a compositor layer state change.
    ///
    /// Closing the space returns every in-flight slot; the compositor will
    /// never report those frames complete. It also ends the input session:
    /// queued spatial events, open interactions and unread hand anchors are
    /// dropped so none of them reach the next session.
    pub fn on_layer_state(&mut self, layer: LayerState) -> ImmersiveSpaceState {
        let next = self.space.on_layer_state(layer);
        if next != self.space {
            debug!("immersive space {:?} -> {:?} ({layer:?})", self.space, next);
        }
        let closing = next == ImmersiveSpaceState::Closed && self.space != next;
        self.space = next;
        if next == ImmersiveSpaceState::Closed {
            self.release_in_flight();
        }
        if closing {
            self.router.reset();
        }
        next
    }

    pub fn on_toggle_request(&mut self) -> ImmersiveSpaceState {
        self.space = self.space.on_toggle_request();
        self.space
    }

    /// Runs one full cycle: dispatch, compose, publish, present, release.
    ///
    /// Synchronizer failures abort the cycle and come back as
    /// [`FrameOutcome::Dropped`]; only misuse of the step API is an `Err`.
    pub fn run_frame(&mut self) -> LoopResult<FrameOutcome> {
        if !self.space.accepts_frames() {
            trace!("frame skipped; space {:?}", self.space);
            if self.space == ImmersiveSpaceState::Closed {
                // Input arriving while closed belongs to no session.
                let dropped = self.router.reset();
                if dropped > 0 {
                    debug!("{dropped} spatial events dropped while closed");
                }
            }
            return Ok(FrameOutcome::Skipped { space: self.space });
        }

        let tracking = self.enter_tracking()?;
        let inputs = self.renderer.frame_inputs(&tracking);
        if let Err(err) = self.activate_frame(&inputs) {
            return Self::dropped(err);
        }
        let snapshot = match self.publish_frame() {
            Ok(snapshot) => snapshot,
            Err(err) => return Self::dropped(err),
        };

        let status = self.renderer.present(&snapshot);
        self.complete_frame(status)?;
        Ok(FrameOutcome::Presented {
            frame_id: snapshot.frame_id,
            events: tracking.report.delivered_events,
        })
    }

    /// `Idle -> TrackingReady`: reaps finished frames, dispatches spatial
    /// events and takes the newest hand anchors.
    pub fn enter_tracking(&mut self) -> LoopResult<TrackingSample> {
        self.expect_phase(FramePhase::Idle, FramePhase::TrackingReady)?;
        self.reap_completed()?;

        let sample = TrackingSample {
            report: self.router.dispatch(),
            hands: self.router.anchors().take_latest(),
        };
        self.tracking = Some(sample);
        self.phase = FramePhase::TrackingReady;
        Ok(sample)
    }

    /// `TrackingReady -> FrameActive`: writes the stereo uniforms into a slot.
    pub fn activate_frame(&mut self, inputs: &FrameInputs) -> LoopResult<FrameSlotHandle> {
        self.expect_phase(FramePhase::TrackingReady, FramePhase::FrameActive)?;
        match self
            .sync
            .begin_frame(&inputs.viewer_pose, &inputs.projections)
        {
            Ok(handle) => {
                self.active = Some(handle);
                self.phase = FramePhase::FrameActive;
                Ok(handle)
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    /// `FrameActive -> Published`.
    pub fn publish_frame(&mut self) -> LoopResult<Arc<FrameSnapshot>> {
        self.expect_phase(FramePhase::FrameActive, FramePhase::Published)?;
        let Some(handle) = self.active.take() else {
            return Err(LoopError::InvalidTransition {
                from: self.phase,
                to: FramePhase::Published,
            });
        };
        match self.sync.publish(handle) {
            Ok(snapshot) => {
                self.published = Some(Arc::clone(&snapshot));
                self.phase = FramePhase::Published;
                Ok(snapshot)
            }
            Err(err) => {
                if let Err(discard) = self.sync.discard(handle) {
                    warn!("frame {} could not be discarded: {discard}", handle.frame_id());
                }
                Err(self.abort(err))
            }
        }
    }

    /// `Published -> Idle`: returns the slot now, or parks it until the
    /// collaborator reports the frame complete.
    pub fn complete_frame(&mut self, status: PresentStatus) -> LoopResult<()> {
        self.expect_phase(FramePhase::Published, FramePhase::Idle)?;
        self.phase = FramePhase::Idle;
        self.tracking = None;
        self.health.clear_on_success();

        let Some(snapshot) = self.published.take() else {
            return Ok(());
        };
        match status {
            PresentStatus::Completed => {
                self.sync.release(snapshot.handle())?;
                trace!("frame {} presented and released", snapshot.frame_id);
            }
            PresentStatus::InFlight => {
                trace!("frame {} in flight", snapshot.frame_id);
                self.in_flight.push(snapshot);
            }
        }
        Ok(())
    }

    fn expect_phase(&self, from: FramePhase, to: FramePhase) -> LoopResult<()> {
        if self.phase == from {
            Ok(())
        } else {
            Err(LoopError::InvalidTransition {
                from: self.phase,
                to,
            })
        }
    }

    /// Ends the cycle after a synchronizer failure.
    fn abort(&mut self, error: SyncError) -> LoopError {
        warn!("frame dropped in {:?}: {error}", self.phase);
        self.phase = FramePhase::Idle;
        self.tracking = None;
        self.health
            .record_drop(&error, self.config.stall_relief_frames);
        self.renderer.on_frame_dropped(&error);
        LoopError::Sync(error)
    }

    fn dropped(err: LoopError) -> LoopResult<FrameOutcome> {
        match err {
            LoopError::Sync(error) => Ok(FrameOutcome::Dropped { error }),
            other => Err(other),
        }
    }

    /// Releases every completed frame, even past a failed release, and
    /// reports the first failure.
    fn reap_completed(&mut self) -> LoopResult<()> {
        let completed = self.renderer.completed_frames();
        let mut first_err = None;
        for frame_id in completed {
            let Some(pos) = self
                .in_flight
                .iter()
                .position(|snapshot| snapshot.frame_id == frame_id)
            else {
                debug!("completion for unknown frame {frame_id} ignored");
                continue;
            };
            let snapshot = self.in_flight.remove(pos);
            match self.sync.release(snapshot.handle()) {
                Ok(()) => trace!("frame {frame_id} completed; slot {} free", snapshot.slot),
                Err(err) => {
                    warn!("frame {frame_id} release failed: {err}");
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn release_in_flight(&mut self) {
        for snapshot in self.in_flight.drain(..) {
            if let Err(err) = self.sync.release(snapshot.handle()) {
                warn!("frame {} release on close failed: {err}", snapshot.frame_id);
            }
        }
    }
}

impl<R> std::fmt::Debug for FrameLoop<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoop")
            .field("phase", &self.phase)
            .field("space", &self.space)
            .field("health", &self.health)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}
