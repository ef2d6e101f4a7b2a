//! Rendering error types.

use thiserror::Error;

use crate::shader::ShaderStage;
use crate::uniform::UniformKind;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No graphics adapter is available on this platform.
    #[error("unsupported platform: no graphics adapter available")]
    UnsupportedPlatform,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// A shader stage failed to compile.
    #[error("error compiling {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    /// The two stages do not fit together.
    #[error("link error in program: {log}")]
    ProgramLink { log: String },

    /// The uniform's declared type cannot be set from the given value.
    #[error("unsupported uniform type for '{name}': declared {declared}, got {given}")]
    UnsupportedUniformType {
        name: String,
        declared: String,
        given: UniformKind,
    },

    /// An attribute used for setup is not an input of the vertex stage.
    #[error("attribute '{0}' is not a vertex input of the program")]
    MissingAttribute(String),

    /// Attribute component counts outside 1..=4.
    #[error("attribute '{name}' has unsupported component count {components}")]
    UnsupportedAttributeFormat { name: String, components: u32 },

    /// The program's vertex buffer is write-once.
    #[error("vertex buffer already uploaded for this program")]
    BufferAlreadyUploaded,

    /// Buffer contents do not match the declared layout.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Drawing was attempted before the vertex buffer was uploaded.
    #[error("no vertex buffer uploaded")]
    NoVertexBuffer,

    /// A draw used a color mask that was never prepared.
    #[error("no pipeline prepared for color mask {0:?}")]
    PipelineNotPrepared(wgpu::ColorWrites),

    /// Texture creation failed.
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),

    /// Frame parameters were rejected.
    #[error(transparent)]
    InvalidParameters(#[from] hornview_core::HornError),

    /// Surface lost.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// Reading the rendered frame back failed.
    #[error("failed to read back frame")]
    ReadbackFailed,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
