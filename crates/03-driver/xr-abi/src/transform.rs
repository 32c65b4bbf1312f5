//! Per-eye transforms and the fixed stereo pair.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Which eye a transform targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Both eyes in buffer order.
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// Fixed position of this eye inside [`StereoUniforms`].
    pub fn index(self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Returns `true` when `m` is finite and has a non-zero determinant.
pub fn is_invertible(m: &Mat4) -> bool {
    if !m.is_finite() {
        return false;
    }
    let det = m.determinant();
    det.is_finite() && det.abs() > f32::MIN_POSITIVE
}

/// Projection, view, and stability-correction matrices for one eye.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformPack {
    /// Eye projection (clip from eye).
    pub projection: Mat4,
    /// Eye view (eye from world origin).
    pub view: Mat4,
    /// Stability correction applied on top of the view; identity when unused.
    pub correction: Mat4,
}

impl Default for TransformPack {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            correction: Mat4::IDENTITY,
        }
    }
}

impl TransformPack {
    /// Builds a pack with an identity correction.
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self {
            projection,
            view,
            correction: Mat4::IDENTITY,
        }
    }

    /// Replaces the correction matrix.
    pub fn with_correction(mut self, correction: Mat4) -> Self {
        self.correction = correction;
        self
    }

    /// Clip-from-world matrix: `projection · (correction · view)`.
    pub fn composed(&self) -> Mat4 {
        self.projection * (self.correction * self.view)
    }

    /// Whether the projection is usable and every matrix is finite.
    pub fn is_valid(&self) -> bool {
        is_invertible(&self.projection) && self.view.is_finite() && self.correction.is_finite()
    }

    /// Column-major GPU layout of this pack.
    pub fn to_gpu(&self) -> GpuTransformPack {
        GpuTransformPack {
            projection: self.projection.to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            correction: self.correction.to_cols_array_2d(),
        }
    }
}

/// Exactly two transform packs: index 0 is the left eye, index 1 the right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoUniforms {
    packs: [TransformPack; 2],
}

impl StereoUniforms {
    /// Pairs the left and right packs in their fixed order.
    pub fn new(left: TransformPack, right: TransformPack) -> Self {
        Self {
            packs: [left, right],
        }
    }

    pub fn left(&self) -> &TransformPack {
        &self.packs[0]
    }

    pub fn right(&self) -> &TransformPack {
        &self.packs[1]
    }

    /// Pack for `eye`.
    pub fn eye(&self, eye: Eye) -> &TransformPack {
        &self.packs[eye.index()]
    }

    /// Both packs in buffer order.
    pub fn packs(&self) -> &[TransformPack; 2] {
        &self.packs
    }

    /// Flattened uniform block ready for upload.
    pub fn to_gpu(&self) -> GpuStereoUniforms {
        GpuStereoUniforms {
            uniforms: [self.packs[0].to_gpu(), self.packs[1].to_gpu()],
        }
    }
}

/// Uniform block for one eye as the shader sees it.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuTransformPack {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub correction: [[f32; 4]; 4],
}

/// Uniform block for both eyes, left first.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuStereoUniforms {
    pub uniforms: [GpuTransformPack; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn eye_indices_are_fixed() {
        assert_eq!(Eye::Left.index(), 0);
        assert_eq!(Eye::Right.index(), 1);
        assert_eq!(Eye::BOTH.map(Eye::index), [0, 1]);
    }

    #[test]
    fn stereo_pair_keeps_left_first() {
        let left = TransformPack::new(Mat4::IDENTITY, Mat4::from_translation(Vec3::X));
        let right = TransformPack::new(Mat4::IDENTITY, Mat4::from_translation(-Vec3::X));
        let stereo = StereoUniforms::new(left, right);
        assert_eq!(stereo.packs().len(), 2);
        assert_eq!(stereo.left(), &left);
        assert_eq!(stereo.eye(Eye::Right), &right);
        assert_eq!(stereo.packs()[0], left);
    }

    #[test]
    fn composition_applies_correction_between_projection_and_view() {
        let projection = Mat4::perspective_rh(1.2, 1.0, 0.1, 100.0);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0));
        let correction = Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0));
        let pack = TransformPack::new(projection, view).with_correction(correction);
        assert_eq!(pack.composed(), projection * (correction * view));
        assert_eq!(
            TransformPack::new(projection, view).composed(),
            projection * view,
            "identity correction must be a no-op"
        );
    }

    #[test]
    fn singular_projection_is_invalid() {
        let pack = TransformPack::new(Mat4::ZERO, Mat4::IDENTITY);
        assert!(!pack.is_valid());
        let mut nan = Mat4::IDENTITY;
        nan.x_axis.x = f32::NAN;
        assert!(!is_invertible(&nan));
        assert!(TransformPack::default().is_valid());
    }

    #[test]
    fn gpu_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<GpuTransformPack>(), 3 * 64);
        assert_eq!(std::mem::size_of::<GpuStereoUniforms>(), 2 * 3 * 64);
        let stereo = StereoUniforms::default();
        let gpu = stereo.to_gpu();
        let bytes: &[u8] = bytemuck::bytes_of(&gpu);
        assert_eq!(bytes.len(), 384);
        assert_eq!(gpu.uniforms[0].projection, Mat4::IDENTITY.to_cols_array_2d());
    }
}
