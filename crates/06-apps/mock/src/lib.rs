//! Scripted render collaborator, tracking source and consumer for tests and
//! the simulator.

use std::collections::VecDeque;
use std::sync::Arc;

use frame_loop::{
    FrameInputs, FrameLoop, FrameLoopConfig, LoopResult, PresentStatus, RenderCollaborator,
    TrackingSample,
};
use glam::{DMat4, DVec3, Mat4, Vec3};
use parking_lot::Mutex;
use xr_abi::{
    Chirality, HandAnchor, HandAnchors, LayerState, ProjectionParams, SpatialBatch, SpatialEvent,
    ViewerPose,
};
use xr_spatial::{IngestHandle, IngestOutcome, SpatialConsumer};
use xr_uniforms::{FrameSnapshot, SyncError};

/// Builds a frame loop around a [`ScriptedRenderer`] with the space already open.
pub fn make_loop(config: FrameLoopConfig) -> LoopResult<FrameLoop<ScriptedRenderer>> {
    make_loop_with(config, ScriptedRenderer::new())
}

pub fn make_loop_with(
    config: FrameLoopConfig,
    renderer: ScriptedRenderer,
) -> LoopResult<FrameLoop<ScriptedRenderer>> {
    let mut frame_loop = FrameLoop::new(config, renderer)?;
    frame_loop.on_layer_state(LayerState::Running);
    Ok(frame_loop)
}

/// Head slowly orbiting the origin at standing height.
pub fn orbit_pose(frame: u64) -> ViewerPose {
    let angle = (frame % 360) as f32 * std::f32::consts::PI / 180.0;
    let origin_from_head =
        Mat4::from_rotation_y(angle) * Mat4::from_translation(Vec3::new(0.0, 1.6, 0.5));
    ViewerPose::new(origin_from_head)
}

/// Render collaborator that keeps each frame in flight for a fixed number of
/// subsequent frames, or forever while stalled.
#[derive(Debug)]
pub struct ScriptedRenderer {
    projections: ProjectionParams,
    hold_frames: u64,
    stalled: bool,
    frame: u64,
    pending: VecDeque<(u64, u64)>,
    presented: Vec<Arc<FrameSnapshot>>,
    dropped: Vec<SyncError>,
    tracking: Vec<TrackingSample>,
}

impl Default for ScriptedRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self {
            projections: ProjectionParams::default(),
            hold_frames: 0,
            stalled: false,
            frame: 0,
            pending: VecDeque::new(),
            presented: Vec::new(),
            dropped: Vec::new(),
            tracking: Vec::new(),
        }
    }

    /// Keeps every presented frame in flight for `frames` later frames.
    pub fn holding(mut self, frames: u64) -> Self {
        self.hold_frames = frames;
        self
    }

    pub fn with_projections(mut self, projections: ProjectionParams) -> Self {
        self.projections = projections;
        self
    }

    /// While stalled, no in-flight frame is ever reported complete.
    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    pub fn presented(&self) -> &[Arc<FrameSnapshot>] {
        &self.presented
    }

    pub fn dropped(&self) -> &[SyncError] {
        &self.dropped
    }

    pub fn tracking(&self) -> &[TrackingSample] {
        &self.tracking
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl RenderCollaborator for ScriptedRenderer {
    fn frame_inputs(&mut self, tracking: &TrackingSample) -> FrameInputs {
        self.tracking.push(*tracking);
        let inputs = FrameInputs {
            viewer_pose: orbit_pose(self.frame),
            projections: self.projections,
        };
        self.frame += 1;
        inputs
    }

    fn present(&mut self, snapshot: &Arc<FrameSnapshot>) -> PresentStatus {
        self.presented.push(Arc::clone(snapshot));
        if self.hold_frames == 0 && !self.stalled {
            return PresentStatus::Completed;
        }
        self.pending
            .push_back((snapshot.frame_id, self.frame + self.hold_frames));
        PresentStatus::InFlight
    }

    fn on_frame_dropped(&mut self, error: &SyncError) {
        self.dropped.push(error.clone());
    }

    fn completed_frames(&mut self) -> Vec<u64> {
        if self.stalled {
            return Vec::new();
        }
        let mut done = Vec::new();
        while let Some(&(frame_id, due)) = self.pending.front() {
            if due > self.frame {
                break;
            }
            self.pending.pop_front();
            done.push(frame_id);
        }
        done
    }
}

/// One pinch gesture: `samples` active poses moving along +X, then `Ended`.
pub fn pinch(id: i32, chirality: Chirality, samples: usize) -> Vec<SpatialEvent> {
    let mut events: Vec<SpatialEvent> = (0..samples)
        .map(|step| {
            let pose = DMat4::from_translation(DVec3::new(step as f64 * 0.01, 1.2, -0.3));
            SpatialEvent::active(id, chirality, pose)
        })
        .collect();
    events.push(SpatialEvent::ended(id, chirality));
    events
}

/// Replays a fixed event script into a router a few events at a time.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTracker {
    script: Vec<SpatialEvent>,
    cursor: usize,
}

impl ScriptedTracker {
    pub fn new(script: Vec<SpatialEvent>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Round-robins several gestures, keeping each gesture's own order.
    pub fn interleaved(gestures: Vec<Vec<SpatialEvent>>) -> Self {
        let mut queues: Vec<VecDeque<SpatialEvent>> =
            gestures.into_iter().map(VecDeque::from).collect();
        let mut script = Vec::new();
        while queues.iter().any(|queue| !queue.is_empty()) {
            for queue in &mut queues {
                if let Some(event) = queue.pop_front() {
                    script.push(event);
                }
            }
        }
        Self::new(script)
    }

    pub fn script(&self) -> &[SpatialEvent] {
        &self.script
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.script.len()
    }

    /// Ingests up to `count` events; returns how many were accepted.
    pub fn feed(&mut self, ingest: &IngestHandle, count: usize) -> usize {
        let end = (self.cursor + count).min(self.script.len());
        let accepted = self.script[self.cursor..end]
            .iter()
            .filter(|event| ingest.ingest(**event) == IngestOutcome::Accepted)
            .count();
        self.cursor = end;
        accepted
    }
}

/// Both hands tracked at fixed offsets from the head.
pub fn hands_at(frame: u64) -> HandAnchors {
    let sway = (frame % 60) as f64 * 0.001;
    HandAnchors::new(
        HandAnchor::tracked(
            Chirality::Left,
            DMat4::from_translation(DVec3::new(-0.2 - sway, 1.2, -0.3)),
        ),
        HandAnchor::tracked(
            Chirality::Right,
            DMat4::from_translation(DVec3::new(0.2 + sway, 1.2, -0.3)),
        ),
    )
}

/// Consumer that keeps every batch it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsumer {
    batches: Arc<Mutex<Vec<SpatialBatch>>>,
}

impl RecordingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<SpatialBatch> {
        self.batches.lock().clone()
    }

    /// Every received event, flattened in delivery order.
    pub fn events(&self) -> Vec<SpatialEvent> {
        self.batches
            .lock()
            .iter()
            .flat_map(|batch| batch.iter().copied())
            .collect()
    }
}

impl SpatialConsumer for RecordingConsumer {
    fn on_batch(&mut self, batch: &SpatialBatch) {
        self.batches.lock().push(Arc::clone(batch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaving_keeps_per_gesture_order() {
        let tracker = ScriptedTracker::interleaved(vec![
            pinch(1, Chirality::Left, 2),
            pinch(2, Chirality::Right, 1),
        ]);
        let ids: Vec<i32> = tracker.script().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn held_frames_complete_after_delay() {
        let mut renderer = ScriptedRenderer::new().holding(2);
        let sample = TrackingSample {
            report: Default::default(),
            hands: None,
        };
        renderer.frame_inputs(&sample);
        let snapshot = Arc::new(FrameSnapshot {
            frame_id: 1,
            slot: 0,
            uniforms: Default::default(),
        });
        assert_eq!(renderer.present(&snapshot), PresentStatus::InFlight);
        assert!(renderer.completed_frames().is_empty());
        renderer.frame_inputs(&sample);
        assert!(renderer.completed_frames().is_empty());
        renderer.frame_inputs(&sample);
        assert_eq!(renderer.completed_frames(), vec![1]);
    }
}
