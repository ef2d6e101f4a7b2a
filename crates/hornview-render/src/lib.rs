//! Rendering backend for hornview.
//!
//! This crate provides the wgpu-based rendering engine, including:
//! - Device, surface and depth buffer management
//! - Shader programs compiled and linked from WGSL via naga reflection
//! - Vertex buffer packing and the surface texture
//! - The off-axis stereo camera
//! - Mono, side-by-side and anaglyph frame rendering

// Internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel sizes and vertex counts fit comfortably in f32 and u32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod camera;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod screenshot;
pub mod shader;
pub mod texture;
pub mod uniform;

pub use buffer::{pack_mesh_group, AttributeBinding, PackedMeshGroup};
pub use camera::{EyeTransforms, Eye, Frustum, StereoCamera};
pub use engine::RenderEngine;
pub use error::{RenderError, RenderResult};
pub use renderer::{plan_passes, ColorMask, EyePass, Renderer, Viewport};
pub use screenshot::{save_image, to_rgba_image, ScreenshotError};
pub use shader::{ProgramLayout, ShaderBuilder, ShaderProgram, ShaderStage};
pub use texture::SurfaceTexture;
pub use uniform::{UniformKind, UniformValue};
