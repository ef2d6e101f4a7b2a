//! Keyboard parameter controls.
//!
//! | Keys            | Parameter                         |
//! |-----------------|-----------------------------------|
//! | `Tab` / `M`     | cycle render mode                 |
//! | `←` / `→`       | eye separation                    |
//! | `↓` / `↑`       | convergence distance              |
//! | `[` / `]`       | field of view                     |
//! | `F`             | toggle infinite far plane         |
//! | `PgDn` / `PgUp` | near plane                        |
//! | `J L` `K I` `U O` | light position x, y, z          |
//! | `-` / `=`       | texture scale                     |
//! | `,` / `.`       | texture rotation                  |
//! | `A D` `S W`     | texture center x, y               |
//! | `G H` `V B`     | texture rotation axis x, y        |

use glam::{Vec2, Vec3};
use hornview_core::{Result, StereoParams, ViewerState};
use winit::keyboard::KeyCode;

const EYE_SEPARATION_STEP: f32 = 0.05;
const CONVERGENCE_STEP: f32 = 0.5;
const NEAR_STEP: f32 = 0.1;
const FOV_STEP_DEGREES: f32 = 1.0;
const LIGHT_STEP: f32 = 0.5;
const TEXTURE_SCALE_STEP: f32 = 0.1;
const TEXTURE_ROTATION_STEP_DEGREES: f32 = 5.0;
const TEXTURE_CENTER_STEP: f32 = 0.05;
const TEXTURE_ROT_AXIS_STEP: f32 = 0.05;

/// One parameter edit triggered by a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterCommand {
    CycleMode,
    EyeSeparation(f32),
    Convergence(f32),
    FovDegrees(f32),
    ToggleInfiniteFar,
    Near(f32),
    Light(Vec3),
    TextureScale(f32),
    TextureRotation(f32),
    TextureCenter(Vec2),
    TextureRotAxis(Vec2),
}

/// The command bound to `code`, if any.
#[must_use]
pub fn command_for_key(code: KeyCode) -> Option<ParameterCommand> {
    use ParameterCommand as C;
    let command = match code {
        KeyCode::Tab | KeyCode::KeyM => C::CycleMode,
        KeyCode::ArrowLeft => C::EyeSeparation(-EYE_SEPARATION_STEP),
        KeyCode::ArrowRight => C::EyeSeparation(EYE_SEPARATION_STEP),
        KeyCode::ArrowDown => C::Convergence(-CONVERGENCE_STEP),
        KeyCode::ArrowUp => C::Convergence(CONVERGENCE_STEP),
        KeyCode::BracketLeft => C::FovDegrees(-FOV_STEP_DEGREES),
        KeyCode::BracketRight => C::FovDegrees(FOV_STEP_DEGREES),
        KeyCode::KeyF => C::ToggleInfiniteFar,
        KeyCode::PageDown => C::Near(-NEAR_STEP),
        KeyCode::PageUp => C::Near(NEAR_STEP),
        KeyCode::KeyJ => C::Light(Vec3::NEG_X * LIGHT_STEP),
        KeyCode::KeyL => C::Light(Vec3::X * LIGHT_STEP),
        KeyCode::KeyK => C::Light(Vec3::NEG_Y * LIGHT_STEP),
        KeyCode::KeyI => C::Light(Vec3::Y * LIGHT_STEP),
        KeyCode::KeyU => C::Light(Vec3::NEG_Z * LIGHT_STEP),
        KeyCode::KeyO => C::Light(Vec3::Z * LIGHT_STEP),
        KeyCode::Minus => C::TextureScale(-TEXTURE_SCALE_STEP),
        KeyCode::Equal => C::TextureScale(TEXTURE_SCALE_STEP),
        KeyCode::Comma => C::TextureRotation(-TEXTURE_ROTATION_STEP_DEGREES),
        KeyCode::Period => C::TextureRotation(TEXTURE_ROTATION_STEP_DEGREES),
        KeyCode::KeyA => C::TextureCenter(Vec2::NEG_X * TEXTURE_CENTER_STEP),
        KeyCode::KeyD => C::TextureCenter(Vec2::X * TEXTURE_CENTER_STEP),
        KeyCode::KeyS => C::TextureCenter(Vec2::NEG_Y * TEXTURE_CENTER_STEP),
        KeyCode::KeyW => C::TextureCenter(Vec2::Y * TEXTURE_CENTER_STEP),
        KeyCode::KeyG => C::TextureRotAxis(Vec2::NEG_X * TEXTURE_ROT_AXIS_STEP),
        KeyCode::KeyH => C::TextureRotAxis(Vec2::X * TEXTURE_ROT_AXIS_STEP),
        KeyCode::KeyV => C::TextureRotAxis(Vec2::NEG_Y * TEXTURE_ROT_AXIS_STEP),
        KeyCode::KeyB => C::TextureRotAxis(Vec2::Y * TEXTURE_ROT_AXIS_STEP),
        _ => return None,
    };
    Some(command)
}

impl ParameterCommand {
    /// Applies the edit. Rejected camera values leave `state` unchanged.
    pub fn apply(self, state: &mut ViewerState) -> Result<()> {
        let options = state.options();
        let stereo = options.stereo;
        let material = options.material;

        match self {
            ParameterCommand::CycleMode => {
                let mode = options.mode.next();
                state.set_mode(mode);
            }
            ParameterCommand::EyeSeparation(delta) => {
                state.set_eye_separation(stereo.eye_separation + delta)?;
            }
            ParameterCommand::Convergence(delta) => {
                state.set_convergence(stereo.convergence + delta)?;
            }
            ParameterCommand::FovDegrees(delta) => {
                state.set_fov_degrees(stereo.fov_degrees() + delta)?;
            }
            ParameterCommand::ToggleInfiniteFar => {
                let far = match stereo.far {
                    Some(_) => None,
                    None => StereoParams::default().far,
                };
                state.set_far(far)?;
            }
            ParameterCommand::Near(delta) => {
                state.set_near(stereo.near + delta)?;
            }
            ParameterCommand::Light(delta) => {
                state.set_light_position(material.light_position + delta);
            }
            ParameterCommand::TextureScale(delta) => {
                state.set_texture_scale(material.texture_scale + Vec2::splat(delta));
            }
            ParameterCommand::TextureRotation(delta) => {
                state.set_texture_rot_angle_deg(material.texture_rot_angle_deg + delta);
            }
            ParameterCommand::TextureCenter(delta) => {
                state.set_texture_center(material.texture_center + delta);
            }
            ParameterCommand::TextureRotAxis(delta) => {
                state.set_texture_rot_axis(material.texture_rot_axis + delta);
            }
        }
        Ok(())
    }
}
