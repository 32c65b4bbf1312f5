use std::sync::Arc;

use xr_abi::{HandAnchors, ProjectionParams, ViewerPose};
use xr_spatial::DispatchReport;
use xr_uniforms::{FrameSnapshot, SyncError};

/// What tracking produced for the frame being composed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSample {
    pub report: DispatchReport,
    /// Newest hand anchors posted since the previous frame, if any.
    pub hands: Option<HandAnchors>,
}

/// Camera inputs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInputs {
    pub viewer_pose: ViewerPose,
    pub projections: ProjectionParams,
}

/// Whether the collaborator is done with a presented snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// The slot may be reused immediately.
    Completed,
    /// The GPU still reads the slot; report the frame id from
    /// [`RenderCollaborator::completed_frames`] once it is done.
    InFlight,
}

/// The renderer side of the frame loop.
pub trait RenderCollaborator {
    /// Supplies the pose and projections after tracking was dispatched.
    fn frame_inputs(&mut self, tracking: &TrackingSample) -> FrameInputs;

    fn present(&mut self, snapshot: &Arc<FrameSnapshot>) -> PresentStatus;

    fn on_frame_dropped(&mut self, _error: &SyncError) {}

    /// Frame ids of in-flight snapshots finished since the last call.
    fn completed_frames(&mut self) -> Vec<u64> {
        Vec::new()
    }
}
