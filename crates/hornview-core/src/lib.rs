//! Core data for hornview.
//!
//! This crate holds everything that does not touch the GPU:
//! - [`surface`] generators for the horn surface and the marker sphere
//! - [`Mesh`] and [`MeshGroup`] strip containers
//! - [`Options`] and the parameter groups it is made of
//! - [`FrameParams`] snapshots and the redraw queue
//! - [`ViewerState`], the setters the parameter controls call

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Step counts are small, u32 -> f32 is exact in practice
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod error;
pub mod frame;
pub mod mesh;
pub mod options;
pub mod state;
pub mod surface;

pub use error::{HornError, Result};
pub use frame::{sensor_rotation_from_euler, FrameParams, RedrawQueue, RedrawReason, RedrawSender};
pub use mesh::{DrawRange, Mesh, MeshGroup, MAX_VERTICES};
pub use options::{
    MarkerParams, MaterialParams, Options, OrthoParams, RenderMode, SceneParams, StereoParams,
    SurfaceParams,
};
pub use state::ViewerState;
pub use surface::{generate_marker_sphere, generate_surface};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
