//! Errors surfaced by the viewer facade.

use hornview_core::HornError;
use hornview_render::{RenderError, ScreenshotError};
use thiserror::Error;

/// Any failure of the headless or windowed viewer.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Invalid options or a setter rejected a value.
    #[error(transparent)]
    Core(#[from] HornError),

    /// GPU setup or drawing failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A captured frame could not be converted or written.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    /// The texture image could not be decoded.
    #[error("failed to load texture: {0}")]
    Texture(#[from] image::ImageError),

    /// The winit event loop could not start or failed while running.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Result type of the facade.
pub type Result<T> = std::result::Result<T, ViewerError>;
