//! Field visualization core for volum.
//!
//! This crate turns sampled scalar and vector fields into renderable data:
//! - [`surface_nets`] extracts one isosurface mesh per iso-level from a structured grid
//! - [`glyph`] builds oriented, scaled glyph instances for vector samples
//! - [`color_map`] evaluates the named colormap ramps
//! - [`statistics`] and [`normalization`] hold the range and remap formulas shared
//!   by the CPU path and the generated shaders
//! - [`dispatch`] chooses between the CPU and GPU-deferred glyph paths
//!
//! The core keeps no state between requests; every call consumes a validated
//! [`FieldDescriptor`] and returns fresh buffers.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Tests index grids with small loop counters
#![cfg_attr(test, allow(clippy::cast_precision_loss))]

pub mod color_map;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod glyph;
pub mod mesh;
pub mod normalization;
pub mod options;
pub mod statistics;
pub mod surface_nets;

pub use color_map::{evaluate, ColorRamp};
pub use dispatch::{ComputePath, DispatchPolicy, FieldOutput, GlyphOutput, ScalarOutput};
pub use error::{Result, VolumError};
pub use field::{
    vec3s_from_flat, Bounds, ColorChannel, ColorSource, FieldDescriptor, FieldSample, GlyphStyle,
    GridShape, MaterialHandle, MaterialKind, ScalarFieldDescriptor, ScalarSample, VectorFieldDescriptor,
    VectorSample,
};
pub use glyph::{CpuGlyphs, GlyphGeometry, GlyphInstance, GlyphUniforms, GpuGlyphs, ResolvedGlyph};
pub use mesh::TriangleMesh;
pub use options::VisualizationOptions;
pub use statistics::FieldStatistics;
pub use surface_nets::{GridTransform, IsoSurface};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec3};
