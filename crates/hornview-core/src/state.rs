//! Mutable viewer state owned by the application loop.

use glam::{Mat4, Vec2, Vec3};

use crate::error::Result;
use crate::frame::FrameParams;
use crate::options::{Options, RenderMode, StereoParams};

/// Parameters edited between frames.
///
/// Each setter changes one uniform or camera field. Camera setters validate
/// the resulting parameters and leave the state untouched on error. Frames
/// read an immutable [`FrameParams`] taken with [`ViewerState::snapshot`].
#[derive(Debug, Clone)]
pub struct ViewerState {
    options: Options,
    sensor_rotation: Option<Mat4>,
}

impl ViewerState {
    /// Creates the state from validated options.
    pub fn new(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            sensor_rotation: None,
        })
    }

    /// The current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Captures the parameters for one frame.
    #[must_use]
    pub fn snapshot(&self, orbit_view: Mat4) -> FrameParams {
        FrameParams {
            mode: self.options.mode,
            stereo: self.options.stereo,
            ortho: self.options.ortho,
            material: self.options.material,
            scene: self.options.scene,
            background_color: self.options.background_color,
            orbit_view,
            sensor_rotation: self.sensor_rotation,
        }
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.options.mode = mode;
    }

    pub fn set_light_position(&mut self, position: Vec3) {
        self.options.material.light_position = position;
    }

    pub fn set_texture_scale(&mut self, scale: Vec2) {
        self.options.material.texture_scale = scale;
    }

    pub fn set_texture_center(&mut self, center: Vec2) {
        self.options.material.texture_center = center;
    }

    pub fn set_texture_rot_axis(&mut self, axis: Vec2) {
        self.options.material.texture_rot_axis = axis;
    }

    pub fn set_texture_rot_angle_deg(&mut self, degrees: f32) {
        self.options.material.texture_rot_angle_deg = degrees;
    }

    /// Sets or clears the device-orientation overlay.
    pub fn set_sensor_rotation(&mut self, rotation: Option<Mat4>) {
        self.sensor_rotation = rotation;
    }

    pub fn set_eye_separation(&mut self, eye_separation: f32) -> Result<()> {
        self.update_stereo(|s| s.eye_separation = eye_separation)
    }

    pub fn set_convergence(&mut self, convergence: f32) -> Result<()> {
        self.update_stereo(|s| s.convergence = convergence)
    }

    /// Sets the field of view from degrees.
    pub fn set_fov_degrees(&mut self, degrees: f32) -> Result<()> {
        self.update_stereo(|s| s.fov = degrees.to_radians())
    }

    pub fn set_near(&mut self, near: f32) -> Result<()> {
        self.update_stereo(|s| s.near = near)
    }

    /// Sets the far plane; `None` makes it infinite.
    pub fn set_far(&mut self, far: Option<f32>) -> Result<()> {
        self.update_stereo(|s| s.far = far)
    }

    fn update_stereo(&mut self, edit: impl FnOnce(&mut StereoParams)) -> Result<()> {
        let mut stereo = self.options.stereo;
        edit(&mut stereo);
        stereo.validate()?;
        self.options.stereo = stereo;
        Ok(())
    }
}
