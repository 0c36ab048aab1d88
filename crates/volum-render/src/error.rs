//! Rendering error types.

use thiserror::Error;

/// Errors that can occur while preparing GPU resources.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Shader compilation failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// The glyph geometry is described by the caller and has no built-in mesh.
    #[error("glyph geometry has no built-in mesh")]
    MissingGlyphMesh,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
