//! Stereo camera and per-eye transforms.
//!
//! Projections map view-space depth to the `[0, 1]` clip range used by wgpu.
//! Stereo uses the off-axis (asymmetric frustum) method: both eyes look down
//! the same axis, each frustum is sheared so the two agree on the convergence
//! plane.

use glam::{Mat4, Vec3};
use hornview_core::{HornError, OrthoParams, SceneParams, StereoParams};

/// Which view a set of transforms is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eye {
    /// Single, unshifted view.
    #[default]
    Center,
    Left,
    Right,
}

impl Eye {
    /// +1 for the left eye, -1 for the right, 0 for the center.
    fn sign(self) -> f32 {
        match self {
            Eye::Center => 0.0,
            Eye::Left => 1.0,
            Eye::Right => -1.0,
        }
    }
}

/// Perspective frustum bounds on the near plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    /// `None` is an infinite far plane.
    pub far: Option<f32>,
}

impl Frustum {
    /// Projection matrix for these bounds.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.far {
            Some(far) => frustum_rh(
                self.left,
                self.right,
                self.bottom,
                self.top,
                self.near,
                far,
            ),
            None => frustum_infinite_rh(self.left, self.right, self.bottom, self.top, self.near),
        }
    }
}

/// Right-handed off-axis perspective projection with `[0, 1]` depth.
#[must_use]
pub fn frustum_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;
    Mat4::from_cols_array(&[
        2.0 * near / width,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 * near / height,
        0.0,
        0.0,
        (right + left) / width,
        (top + bottom) / height,
        far / depth,
        -1.0,
        0.0,
        0.0,
        near * far / depth,
        0.0,
    ])
}

/// [`frustum_rh`] with the far plane at infinity.
#[must_use]
pub fn frustum_infinite_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    Mat4::from_cols_array(&[
        2.0 * near / width,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 * near / height,
        0.0,
        0.0,
        (right + left) / width,
        (top + bottom) / height,
        -1.0,
        -1.0,
        0.0,
        0.0,
        -near,
        0.0,
    ])
}

/// The matrices pushed to the shader for one draw pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeTransforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub model_view: Mat4,
    pub normal_matrix: Mat4,
}

impl EyeTransforms {
    /// Builds the set from view, model and projection.
    #[must_use]
    pub fn new(view: Mat4, model: Mat4, projection: Mat4) -> Self {
        let model_view = view * model;
        Self {
            view,
            projection,
            model_view,
            normal_matrix: normal_matrix(model_view),
        }
    }
}

/// Inverse transpose of the model-view matrix.
#[must_use]
pub fn normal_matrix(model_view: Mat4) -> Mat4 {
    model_view.transpose().inverse()
}

/// Object rotation shared by every view: base correction, orbit, sensor.
#[must_use]
pub fn scene_rotation(scene: &SceneParams, orbit_view: Mat4, sensor: Option<Mat4>) -> Mat4 {
    scene.base_rotation() * orbit_view * sensor.unwrap_or(Mat4::IDENTITY)
}

/// Camera for off-axis stereo. Rebuilt from parameters every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoCamera {
    params: StereoParams,
    aspect_ratio: f32,
}

impl StereoCamera {
    /// Creates a camera, rejecting parameters that give a degenerate frustum.
    pub fn new(params: StereoParams, aspect_ratio: f32) -> Result<Self, HornError> {
        params.validate()?;
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(HornError::InvalidCamera {
                field: "aspect_ratio",
                value: aspect_ratio,
                reason: "must be positive",
            });
        }
        Ok(Self {
            params,
            aspect_ratio,
        })
    }

    #[must_use]
    pub fn params(&self) -> &StereoParams {
        &self.params
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Asymmetric frustum for `eye`. The center eye gets the symmetric one.
    #[must_use]
    pub fn frustum(&self, eye: Eye) -> Frustum {
        let StereoParams {
            eye_separation,
            convergence,
            fov,
            near,
            far,
        } = self.params;

        let half_tan = (fov * 0.5).tan();
        let top = near * half_tan;
        let a = self.aspect_ratio * half_tan * convergence;
        let half_sep = 0.5 * eye_separation * eye.sign();

        Frustum {
            left: -(a - half_sep) * near / convergence,
            right: (a + half_sep) * near / convergence,
            bottom: -top,
            top,
            near,
            far,
        }
    }

    /// Projection matrix for `eye`.
    #[must_use]
    pub fn projection_matrix(&self, eye: Eye) -> Mat4 {
        self.frustum(eye).projection_matrix()
    }

    /// Horizontal shift applied to the scene for `eye`.
    ///
    /// The left eye sits at `-sep/2`, so the scene moves by `+sep/2`.
    #[must_use]
    pub fn eye_shift(&self, eye: Eye) -> f32 {
        0.5 * self.params.eye_separation * eye.sign()
    }

    /// View matrix for `eye` with the scene pushed back by `distance`.
    #[must_use]
    pub fn view_matrix(&self, eye: Eye, distance: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -distance))
            * Mat4::from_translation(Vec3::new(self.eye_shift(eye), 0.0, 0.0))
    }

    /// All transforms for `eye`.
    #[must_use]
    pub fn eye_transforms(
        &self,
        eye: Eye,
        scene: &SceneParams,
        orbit_view: Mat4,
        sensor: Option<Mat4>,
    ) -> EyeTransforms {
        EyeTransforms::new(
            self.view_matrix(eye, scene.distance),
            scene_rotation(scene, orbit_view, sensor),
            self.projection_matrix(eye),
        )
    }
}

/// Orthographic projection for the mono view, widened by the aspect ratio.
#[must_use]
pub fn mono_projection(ortho: &OrthoParams, aspect_ratio: f32) -> Mat4 {
    Mat4::orthographic_rh(
        ortho.left * aspect_ratio,
        ortho.right * aspect_ratio,
        ortho.bottom,
        ortho.top,
        ortho.near,
        ortho.far,
    )
}

/// Transforms for the single mono pass.
#[must_use]
pub fn mono_transforms(
    ortho: &OrthoParams,
    aspect_ratio: f32,
    scene: &SceneParams,
    orbit_view: Mat4,
    sensor: Option<Mat4>,
) -> EyeTransforms {
    EyeTransforms::new(
        Mat4::from_translation(Vec3::new(0.0, 0.0, -scene.distance)),
        scene_rotation(scene, orbit_view, sensor),
        mono_projection(ortho, aspect_ratio),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use proptest::prelude::*;

    fn camera(eye_separation: f32, far: Option<f32>) -> StereoCamera {
        let params = StereoParams {
            eye_separation,
            far,
            ..StereoParams::default()
        };
        StereoCamera::new(params, 4.0 / 3.0).unwrap()
    }

    #[test]
    fn test_zero_separation_matches_symmetric_perspective() {
        let cam = camera(0.0, Some(100.0));
        let p = cam.params();
        let expected = Mat4::perspective_rh(p.fov, 4.0 / 3.0, p.near, 100.0);

        for eye in [Eye::Left, Eye::Right, Eye::Center] {
            assert!(cam.projection_matrix(eye).abs_diff_eq(expected, 1e-5), "{eye:?}");
        }
    }

    #[test]
    fn test_infinite_far_matches_glam() {
        let cam = camera(0.0, None);
        let p = cam.params();
        let expected = Mat4::perspective_infinite_rh(p.fov, 4.0 / 3.0, p.near);
        assert!(cam.projection_matrix(Eye::Left).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_eye_frusta_mirror_each_other() {
        let cam = camera(0.4, Some(100.0));
        let left = cam.frustum(Eye::Left);
        let right = cam.frustum(Eye::Right);
        assert!((left.left + right.right).abs() < 1e-6);
        assert!((left.right + right.left).abs() < 1e-6);
        assert!(left.right > -left.left);
        assert_eq!(left.top, right.top);
    }

    #[test]
    fn test_near_and_far_map_to_unit_depth() {
        let cam = camera(0.4, Some(100.0));
        let proj = cam.projection_matrix(Eye::Left);
        let near = proj * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-6);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_convergence_plane_has_zero_parallax() {
        let cam = camera(0.4, Some(100.0));
        let c = cam.params().convergence;

        // A point on the convergence plane straight ahead of the rig, in
        // scene coordinates before the eye shift.
        for x in [-1.0_f32, 0.0, 2.5] {
            let point = Vec4::new(x, 0.3, -c, 1.0);
            let clip = |eye| {
                let shifted = Mat4::from_translation(Vec3::new(cam.eye_shift(eye), 0.0, 0.0)) * point;
                let p = cam.projection_matrix(eye) * shifted;
                p.x / p.w
            };
            assert!((clip(Eye::Left) - clip(Eye::Right)).abs() < 1e-5, "x = {x}");
        }
    }

    #[test]
    fn test_points_behind_convergence_have_positive_parallax() {
        let cam = camera(0.4, Some(100.0));
        let point = Vec4::new(0.0, 0.0, -30.0, 1.0);
        let ndc_x = |eye| {
            let shifted = Mat4::from_translation(Vec3::new(cam.eye_shift(eye), 0.0, 0.0)) * point;
            let p = cam.projection_matrix(eye) * shifted;
            p.x / p.w
        };
        // Uncrossed: the right eye sees the point further right.
        assert!(ndc_x(Eye::Right) > ndc_x(Eye::Left));
    }

    #[test]
    fn test_model_view_composition_order() {
        let cam = camera(0.4, Some(100.0));
        let scene = SceneParams {
            distance: 10.0,
            base_rotation_axis: Vec3::Z,
            base_rotation_angle: 0.0,
        };
        let t = cam.eye_transforms(Eye::Left, &scene, Mat4::IDENTITY, None);
        let origin = t.model_view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.abs_diff_eq(Vec4::new(0.2, 0.0, -10.0, 1.0), 1e-6));

        let right = cam.eye_transforms(Eye::Right, &scene, Mat4::IDENTITY, None);
        let origin = right.model_view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.abs_diff_eq(Vec4::new(-0.2, 0.0, -10.0, 1.0), 1e-6));
    }

    #[test]
    fn test_sensor_rotation_applies_before_orbit() {
        let scene = SceneParams {
            distance: 0.0,
            base_rotation_axis: Vec3::Z,
            base_rotation_angle: 0.0,
        };
        let orbit = Mat4::from_rotation_y(0.5);
        let sensor = Mat4::from_rotation_x(0.25);
        let rotation = scene_rotation(&scene, orbit, Some(sensor));
        assert!(rotation.abs_diff_eq(orbit * sensor, 1e-6));
        assert!(scene_rotation(&scene, orbit, None).abs_diff_eq(orbit, 1e-6));
    }

    #[test]
    fn test_mono_projection_is_flipped_and_widened() {
        let ortho = OrthoParams::default();
        let proj = mono_projection(&ortho, 2.0);
        // x = +2 maps to the left edge, y = +1 to the bottom.
        let p = proj * Vec4::new(2.0, 1.0, -1.0, 1.0);
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!((p.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_aspect_is_rejected() {
        assert!(StereoCamera::new(StereoParams::default(), 0.0).is_err());
        assert!(StereoCamera::new(StereoParams::default(), f32::NAN).is_err());
    }

    proptest! {
        #[test]
        fn prop_normal_matrix_times_transposed_model_view_is_identity(
            angle in -3.0f32..3.0,
            ax in -1.0f32..1.0,
            ay in -1.0f32..1.0,
            orbit in -3.0f32..3.0,
            sep in 0.0f32..2.0,
            distance in 1.0f32..50.0,
        ) {
            let axis = Vec3::new(ax, ay, 1.0);
            let scene = SceneParams {
                distance,
                base_rotation_axis: axis,
                base_rotation_angle: angle,
            };
            let cam = camera(sep, Some(100.0));
            for eye in [Eye::Left, Eye::Right] {
                let t = cam.eye_transforms(eye, &scene, Mat4::from_rotation_y(orbit), None);
                let product = t.normal_matrix * t.model_view.transpose();
                prop_assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-3));
            }
        }
    }
}
