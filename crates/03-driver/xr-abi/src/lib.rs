//! Value types shared between the render collaborator, the tracking source,
//! and the frame services.
//!
//! This crate defines the protocol boundary between the frame loop (layer 05)
//! and the uniform/input services (layer 04), with no service logic of its own.

/// Layer-renderer and immersive-space lifecycle states.
pub mod layer;
/// Head pose and per-eye projection inputs.
pub mod pose;
/// Hand/controller samples and hand anchors.
pub mod spatial;
/// Per-eye transform packs and the stereo uniform pair.
pub mod transform;

pub use glam::{DMat4, Mat4};
pub use layer::{ImmersiveSpaceState, LayerState};
pub use pose::{EyeProjection, ProjectionParams, ViewerPose};
pub use spatial::{Chirality, HandAnchor, HandAnchors, SpatialBatch, SpatialEvent, SpatialPhase};
pub use transform::{
    is_invertible, Eye, GpuStereoUniforms, GpuTransformPack, StereoUniforms, TransformPack,
};
