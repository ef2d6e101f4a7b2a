//! Configuration options for hornview.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{HornError, Result};
use crate::mesh::{strip_vertex_count, MAX_VERTICES};

/// Global configuration options for hornview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Revolution surface parameters.
    pub surface: SurfaceParams,

    /// Marker sphere parameters.
    pub marker: MarkerParams,

    /// Stereo camera parameters.
    pub stereo: StereoParams,

    /// Orthographic box used by the mono mode.
    pub ortho: OrthoParams,

    /// Lighting and texture transform.
    pub material: MaterialParams,

    /// Fixed scene placement.
    pub scene: SceneParams,

    /// Active render mode.
    pub mode: RenderMode,

    /// Initial window width in logical pixels.
    pub window_width: u32,

    /// Initial window height in logical pixels.
    pub window_height: u32,

    /// Background color.
    pub background_color: Vec3,

    /// Image applied to the surface once decoded.
    pub texture_path: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            surface: SurfaceParams::default(),
            marker: MarkerParams::default(),
            stereo: StereoParams::default(),
            ortho: OrthoParams::default(),
            material: MaterialParams::default(),
            scene: SceneParams::default(),
            mode: RenderMode::default(),
            window_width: 800,
            window_height: 600,
            background_color: Vec3::ZERO,
            texture_path: None,
        }
    }
}

impl Options {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading options from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    /// Writes options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validates every parameter group.
    pub fn validate(&self) -> Result<()> {
        self.surface.validate()?;
        self.marker.validate()?;
        self.stereo.validate()?;
        self.ortho.validate()?;
        self.scene.validate()?;
        Ok(())
    }
}

fn check_vertex_budget(count: usize) -> Result<()> {
    if count > MAX_VERTICES {
        return Err(HornError::TooManyVertices {
            count,
            max: MAX_VERTICES,
        });
    }
    Ok(())
}

/// Parameters of the horn revolution surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    /// Half height `H`; the profile is swept over `z` in `[-H, H)`.
    pub height: f32,
    /// Profile parameter `P` in `r(z) = (|z| - H)^2 / (2P)`.
    pub profile: f32,
    /// Number of steps along `z` (`N_z`).
    pub z_steps: u32,
    /// Number of azimuth steps over 360 degrees (`N_b`).
    pub azimuth_steps: u32,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            height: 1.0,
            profile: 0.5,
            z_steps: 20,
            azimuth_steps: 72,
        }
    }
}

impl SurfaceParams {
    /// Sets the azimuth resolution from a step size in degrees.
    ///
    /// The step must be finite and positive; the resulting parameters are
    /// validated.
    pub fn with_azimuth_step_degrees(mut self, step: f32) -> Result<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(HornError::InvalidSurface(format!(
                "azimuth step must be finite and positive, got {step}"
            )));
        }
        let steps = (360.0 / step).round().max(1.0);
        if steps > u32::MAX as f32 {
            return Err(HornError::InvalidSurface(format!(
                "azimuth step {step} is too small"
            )));
        }
        self.azimuth_steps = steps as u32;
        self.validate()?;
        Ok(self)
    }

    /// Step along `z`.
    #[must_use]
    pub fn z_step(&self) -> f32 {
        2.0 * self.height / self.z_steps as f32
    }

    /// Step along the azimuth, in degrees.
    #[must_use]
    pub fn azimuth_step_degrees(&self) -> f32 {
        360.0 / self.azimuth_steps as f32
    }

    /// Number of vertices the generator emits.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        strip_vertex_count(self.z_steps, self.azimuth_steps)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(HornError::InvalidSurface(format!(
                "height must be positive, got {}",
                self.height
            )));
        }
        if !(self.profile.is_finite() && self.profile > 0.0) {
            return Err(HornError::InvalidSurface(format!(
                "profile must be positive, got {}",
                self.profile
            )));
        }
        if self.z_steps == 0 || self.azimuth_steps == 0 {
            return Err(HornError::InvalidSurface(
                "step counts must be at least 1".into(),
            ));
        }
        check_vertex_budget(self.vertex_count())
    }
}

/// Parameters of the marker sphere drawn next to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerParams {
    /// Whether the marker is part of the mesh group.
    pub enabled: bool,
    /// Sphere radius.
    pub radius: f32,
    /// Offset of the sphere center along the X axis.
    pub offset: f32,
    /// Latitude divisions.
    pub stacks: u32,
    /// Longitude divisions.
    pub slices: u32,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.08,
            offset: 1.4,
            stacks: 12,
            slices: 24,
        }
    }
}

impl MarkerParams {
    /// Number of vertices the sphere generator emits.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        strip_vertex_count(self.stacks, self.slices)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(HornError::InvalidSurface(format!(
                "marker radius must be positive, got {}",
                self.radius
            )));
        }
        if self.stacks == 0 || self.slices == 0 {
            return Err(HornError::InvalidSurface(
                "marker stacks and slices must be at least 1".into(),
            ));
        }
        check_vertex_budget(self.vertex_count())
    }
}

/// Stereo camera parameters.
///
/// `far == None` selects an infinite far plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoParams {
    /// Distance between the two eyes.
    pub eye_separation: f32,
    /// Distance to the zero-parallax plane.
    pub convergence: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane, or `None` for infinity.
    pub far: Option<f32>,
}

impl Default for StereoParams {
    fn default() -> Self {
        Self {
            eye_separation: 0.4,
            convergence: 10.0,
            fov: std::f32::consts::FRAC_PI_6,
            near: 1.0,
            far: Some(100.0),
        }
    }
}

impl StereoParams {
    /// Returns FOV in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// Rejects values that would produce a degenerate or singular frustum.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, value, reason| HornError::InvalidCamera {
            field,
            value,
            reason,
        };
        if !(self.eye_separation.is_finite() && self.eye_separation >= 0.0) {
            return Err(invalid(
                "eye_separation",
                self.eye_separation,
                "must be finite and non-negative",
            ));
        }
        if !(self.convergence.is_finite() && self.convergence > 0.0) {
            return Err(invalid(
                "convergence",
                self.convergence,
                "must be finite and positive",
            ));
        }
        if !(self.fov > 0.0 && self.fov < std::f32::consts::PI) {
            return Err(invalid("fov", self.fov, "must lie in (0, pi) radians"));
        }
        if !(self.near.is_finite() && self.near > 0.0) {
            return Err(invalid("near", self.near, "must be finite and positive"));
        }
        if let Some(far) = self.far {
            if far.is_nan() || far <= self.near {
                return Err(invalid("far", far, "must be greater than near"));
            }
        }
        Ok(())
    }
}

/// Orthographic box for the mono mode.
///
/// The default box is mirrored on both axes (`left > right`, `bottom > top`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthoParams {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrthoParams {
    fn default() -> Self {
        Self {
            left: 1.0,
            right: -1.0,
            bottom: 1.0,
            top: -1.0,
            near: 0.1,
            far: 500.0,
        }
    }
}

impl OrthoParams {
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, value| HornError::InvalidCamera {
            field,
            value,
            reason: "orthographic box has zero extent",
        };
        if self.left == self.right {
            return Err(invalid("ortho.left", self.left));
        }
        if self.bottom == self.top {
            return Err(invalid("ortho.bottom", self.bottom));
        }
        if self.near == self.far {
            return Err(invalid("ortho.near", self.near));
        }
        Ok(())
    }
}

/// Light and texture-transform uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// Point light position in view space.
    pub light_position: Vec3,
    /// Texture coordinate scale.
    pub texture_scale: Vec2,
    /// Center of the texture scaling.
    pub texture_center: Vec2,
    /// Pivot of the texture rotation.
    pub texture_rot_axis: Vec2,
    /// Texture rotation in degrees.
    pub texture_rot_angle_deg: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            light_position: Vec3::ZERO,
            texture_scale: Vec2::ONE,
            texture_center: Vec2::ZERO,
            texture_rot_axis: Vec2::ZERO,
            texture_rot_angle_deg: 0.0,
        }
    }
}

/// Fixed placement of the surface in front of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    /// Distance `D` from the eyes to the surface origin.
    pub distance: f32,
    /// Axis of the fixed correction rotation (normalized on use).
    pub base_rotation_axis: Vec3,
    /// Angle of the fixed correction rotation in radians.
    pub base_rotation_angle: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            distance: 10.0,
            base_rotation_axis: Vec3::new(1.0, 1.0, -1.0),
            base_rotation_angle: 1.5,
        }
    }
}

impl SceneParams {
    /// The fixed correction rotation.
    #[must_use]
    pub fn base_rotation(&self) -> Mat4 {
        match self.base_rotation_axis.try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, self.base_rotation_angle),
            None => Mat4::IDENTITY,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.distance.is_finite() {
            return Err(HornError::InvalidCamera {
                field: "scene.distance",
                value: self.distance,
                reason: "must be finite",
            });
        }
        Ok(())
    }
}

/// How a frame is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderMode {
    /// Single orthographic draw.
    Mono,
    /// Left and right eye in two halves of the target.
    SideBySide,
    /// Both eyes in one image, split by color channel.
    #[default]
    Anaglyph,
}

impl RenderMode {
    /// Whether the mode draws two eyes.
    #[must_use]
    pub fn is_stereo(self) -> bool {
        !matches!(self, RenderMode::Mono)
    }

    /// The mode after this one, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            RenderMode::Mono => RenderMode::SideBySide,
            RenderMode::SideBySide => RenderMode::Anaglyph,
            RenderMode::Anaglyph => RenderMode::Mono,
        }
    }

    /// Returns display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Mono => "mono",
            RenderMode::SideBySide => "side-by-side",
            RenderMode::Anaglyph => "anaglyph",
        }
    }
}
