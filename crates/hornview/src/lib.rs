//! hornview: a stereoscopic viewer for a textured, lit revolution surface.
//!
//! The surface is the "horn" obtained by revolving `r(z) = (|z| - H)^2 / (2P)`
//! about the Z axis. It is drawn with a point light and an optional image
//! texture, in mono, side-by-side or red/cyan anaglyph stereo.
//!
//! # Quick Start
//!
//! ```no_run
//! use hornview::*;
//!
//! fn main() -> Result<()> {
//!     let mut options = Options::default();
//!     options.mode = RenderMode::Anaglyph;
//!     options.stereo.eye_separation = 0.3;
//!
//!     // Opens a window and blocks until it is closed.
//!     show(options)
//! }
//! ```
//!
//! # Headless
//!
//! [`render_to_image`] and [`render_to_file`] draw one frame without a
//! window. [`HeadlessViewer`] keeps the GPU context alive across frames.
//!
//! # Controls
//!
//! Dragging with the left mouse button rotates the trackball, `R` resets it
//! and `Escape` closes the window. See [`command_for_key`] for the parameter
//! keys.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

mod app;
mod error;
pub mod headless;
pub mod orbit;
pub mod texture_loader;

pub use app::{command_for_key, run_app, ParameterCommand, UserEvent, Viewer, ViewerHandle};
pub use error::{Result, ViewerError};
pub use headless::{render_to_file, render_to_image, HeadlessViewer};
pub use orbit::{TrackballController, ViewMatrixSource};
pub use texture_loader::{load_texture, spawn_texture_load, TextureLoad};

// Re-export core types
pub use hornview_core::{
    sensor_rotation_from_euler, FrameParams, HornError, MarkerParams, MaterialParams, Mat4,
    Options, OrthoParams, RedrawQueue, RedrawReason, RedrawSender, RenderMode, SceneParams,
    StereoParams, SurfaceParams, Vec2, Vec3, Vec4, ViewerState,
};

// Re-export render types
pub use hornview_render::{Eye, EyeTransforms, RenderEngine, RenderError, Renderer, StereoCamera};

/// Initializes `env_logger` from `RUST_LOG`. Calling it again is harmless.
pub fn init_logging() {
    // Another logger may already be installed by the host application.
    let _ = env_logger::try_init();
}

/// Shows the viewer window.
///
/// Blocks until the window is closed (by pressing `Escape` or clicking the
/// close button).
pub fn show(options: Options) -> Result<()> {
    init_logging();
    log::info!("hornview starting in {} mode", options.mode.name());
    run_app(options)
}
