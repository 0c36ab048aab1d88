//! Error types for volum.

use thiserror::Error;

/// The main error type for field visualization requests.
///
/// Every variant is a validation failure: the request is rejected before any
/// geometry is computed. Unknown colormap names, unknown color channels and
/// uniform vector magnitudes are not errors; they fall back to defaults.
#[derive(Error, Debug)]
pub enum VolumError {
    /// A grid or sample shape has a non-positive or missing dimension.
    #[error("invalid shape {0:?}: every dimension must be positive")]
    InvalidShape(Vec<i64>),

    /// Data size mismatch between a shape and its values.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Positions and vectors of a vector field have different lengths.
    #[error("positions and vectors must have the same length, got {positions} and {vectors}")]
    LengthMismatch { positions: usize, vectors: usize },

    /// A required array is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Glyph length bounds are negative or inverted.
    #[error("invalid glyph length range [{min}, {max}]")]
    InvalidLengthRange { min: f32, max: f32 },

    /// A flattened coordinate array is not made of whole triples.
    #[error("flattened coordinate array of length {0} is not a multiple of 3")]
    MalformedCoordinates(usize),

    /// A scalar field was submitted without an explicit grid shape.
    #[error("scalar fields require an explicit grid shape")]
    MissingShape,

    /// The object description names a type that cannot be built.
    #[error("unsupported object type '{0}'")]
    UnsupportedObject(String),

    /// The object description names a material type that cannot be built.
    #[error("unknown material type '{0}'")]
    UnknownMaterial(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for volum operations.
pub type Result<T> = std::result::Result<T, VolumError>;
