//! Inputs supplied by the render collaborator each frame.

use glam::{Mat4, Vec3};

use crate::transform::Eye;

/// Head pose for the frame about to be rendered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerPose {
    /// World origin from head.
    pub origin_from_head: Mat4,
    /// Stability correction computed upstream; identity when no adjustment is needed.
    pub correction: Mat4,
}

impl Default for ViewerPose {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

impl ViewerPose {
    /// Pose with an identity correction.
    pub fn new(origin_from_head: Mat4) -> Self {
        Self {
            origin_from_head,
            correction: Mat4::IDENTITY,
        }
    }

    /// Replaces the stability correction.
    pub fn with_correction(mut self, correction: Mat4) -> Self {
        self.correction = correction;
        self
    }
}

/// Projection and placement of one eye relative to the head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeProjection {
    /// Clip from eye.
    pub projection: Mat4,
    /// Head from eye; usually a half-IPD translation.
    pub head_from_eye: Mat4,
}

impl EyeProjection {
    pub fn new(projection: Mat4, head_from_eye: Mat4) -> Self {
        Self {
            projection,
            head_from_eye,
        }
    }

    /// Right-handed perspective eye offset sideways by `eye_offset_x` metres.
    pub fn symmetric(fov_y_radians: f32, aspect: f32, near: f32, far: f32, eye_offset_x: f32) -> Self {
        Self {
            projection: Mat4::perspective_rh(fov_y_radians, aspect, near, far),
            head_from_eye: Mat4::from_translation(Vec3::new(eye_offset_x, 0.0, 0.0)),
        }
    }
}

/// Per-eye projection parameters for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionParams {
    pub left: EyeProjection,
    pub right: EyeProjection,
}

impl ProjectionParams {
    pub fn new(left: EyeProjection, right: EyeProjection) -> Self {
        Self { left, right }
    }

    /// Matching perspective for both eyes separated by `ipd` metres.
    pub fn symmetric(fov_y_radians: f32, aspect: f32, near: f32, far: f32, ipd: f32) -> Self {
        let half = ipd * 0.5;
        Self {
            left: EyeProjection::symmetric(fov_y_radians, aspect, near, far, -half),
            right: EyeProjection::symmetric(fov_y_radians, aspect, near, far, half),
        }
    }

    pub fn eye(&self, eye: Eye) -> &EyeProjection {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self::symmetric(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0, 0.064)
    }
}
