//! Error types for hornview.

use thiserror::Error;

/// The main error type for hornview operations.
#[derive(Error, Debug)]
pub enum HornError {
    /// A camera parameter is outside its valid range.
    #[error("invalid camera parameter '{field}': {value} ({reason})")]
    InvalidCamera {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },

    /// Surface or marker generation parameters are unusable.
    #[error("invalid surface parameters: {0}")]
    InvalidSurface(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A mesh has too few vertices to form a triangle strip.
    #[error("mesh needs at least 3 vertices, got {0}")]
    DegenerateMesh(usize),

    /// A mesh or mesh group exceeds the drawable vertex limit.
    #[error("{count} vertices exceed the limit of {max}")]
    TooManyVertices { count: usize, max: usize },

    /// Rendering error.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for hornview operations.
pub type Result<T> = std::result::Result<T, HornError>;
