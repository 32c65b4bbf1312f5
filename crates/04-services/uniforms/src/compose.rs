//! Eye transform composition.

use xr_abi::{is_invertible, Eye, ProjectionParams, StereoUniforms, TransformPack, ViewerPose};

use crate::error::{SyncError, SyncResult};

/// Builds the left/right transform packs for one frame.
///
/// Each eye's view is the inverse of `origin_from_head · head_from_eye`; the
/// pose's correction is carried through unchanged so the shader applies
/// `projection · (correction · view)`.
pub fn stereo_uniforms(pose: &ViewerPose, params: &ProjectionParams) -> SyncResult<StereoUniforms> {
    if !is_invertible(&pose.origin_from_head) || !pose.correction.is_finite() {
        return Err(SyncError::InvalidPose);
    }

    let [left, right] = Eye::BOTH.map(|eye| eye_pack(pose, params, eye));
    Ok(StereoUniforms::new(left?, right?))
}

fn eye_pack(pose: &ViewerPose, params: &ProjectionParams, eye: Eye) -> SyncResult<TransformPack> {
    let eye_params = params.eye(eye);
    if !is_invertible(&eye_params.projection) {
        return Err(SyncError::InvalidProjection { eye });
    }
    let origin_from_eye = pose.origin_from_head * eye_params.head_from_eye;
    if !is_invertible(&origin_from_eye) {
        return Err(SyncError::InvalidPose);
    }
    let pack = TransformPack::new(eye_params.projection, origin_from_eye.inverse())
        .with_correction(pose.correction);
    debug_assert!(
        pack.is_valid() && pack.composed().is_finite(),
        "{eye:?} pack built from checked inputs"
    );
    Ok(pack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3, Vec4};
    use xr_abi::EyeProjection;

    #[test]
    fn eyes_are_offset_in_opposite_directions() {
        let params = ProjectionParams::symmetric(1.2, 1.0, 0.1, 50.0, 0.064);
        let uniforms = stereo_uniforms(&ViewerPose::default(), &params).expect("uniforms");

        // A point straight ahead lands right of centre for the left eye.
        let ahead = Vec4::new(0.0, 0.0, -1.0, 1.0);
        let left = uniforms.left().view * ahead;
        let right = uniforms.right().view * ahead;
        assert!((left.x - 0.032).abs() < 1e-6, "left eye sees {left:?}");
        assert!((right.x + 0.032).abs() < 1e-6, "right eye sees {right:?}");
    }

    #[test]
    fn head_translation_moves_the_view() {
        let params = ProjectionParams::symmetric(1.2, 1.0, 0.1, 50.0, 0.0);
        let pose = ViewerPose::new(Mat4::from_translation(Vec3::new(0.0, 1.5, 0.0)));
        let uniforms = stereo_uniforms(&pose, &params).expect("uniforms");
        let head_in_eye = uniforms.left().view * Vec4::new(0.0, 1.5, 0.0, 1.0);
        assert!(head_in_eye.truncate().length() < 1e-6);
    }

    #[test]
    fn correction_is_passed_through() {
        let correction = Mat4::from_rotation_y(0.1);
        let pose = ViewerPose::default().with_correction(correction);
        let uniforms = stereo_uniforms(&pose, &ProjectionParams::default()).expect("uniforms");
        assert_eq!(uniforms.left().correction, correction);
        assert_eq!(uniforms.right().correction, correction);
    }

    #[test]
    fn singular_inputs_are_rejected() {
        let mut params = ProjectionParams::default();
        params.right = EyeProjection::new(Mat4::ZERO, Mat4::IDENTITY);
        assert_eq!(
            stereo_uniforms(&ViewerPose::default(), &params),
            Err(SyncError::InvalidProjection { eye: Eye::Right })
        );

        let pose = ViewerPose::new(Mat4::ZERO);
        assert_eq!(
            stereo_uniforms(&pose, &ProjectionParams::default()),
            Err(SyncError::InvalidPose)
        );
    }
}
