//! volum: scientific field visualization.
//!
//! volum turns sampled scalar and vector fields into data a renderer can draw
//! directly: one isosurface mesh per iso-level for scalar grids, and one
//! oriented, scaled glyph instance per sample for vector fields.
//!
//! # Quick Start
//!
//! ```no_run
//! use volum::*;
//!
//! fn main() -> Result<()> {
//!     let field = VectorFieldDescriptor::new(
//!         vec![Vec3::ZERO, Vec3::ONE],
//!         vec![Vec3::X, Vec3::new(0.0, 0.0, 2.0)],
//!         Bounds::UNIT,
//!         GlyphStyle::default(),
//!         ColorSource::ramp_named("viridis"),
//!     )?;
//!
//!     match visualize(&field.into(), &VisualizationOptions::default())? {
//!         FieldOutput::Glyphs(GlyphOutput::Cpu(glyphs)) => println!("{} glyphs", glyphs.len()),
//!         other => println!("{other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`volum_core`] holds the algorithms: colormaps, statistics, surface nets,
//!   glyph building and the CPU/GPU dispatch policy
//! - [`render`] generates the WGSL and wgpu resources of the GPU-deferred path
//! - [`scene`] resolves JSON object descriptions (`Contour`, `Quiver`,
//!   primitives) into requests
//!
//! Requests are independent. With the `parallel` feature, [`visualize_all`]
//! and [`scene::Scene::visualize`] spread them over a rayon thread pool.

pub mod scene;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Re-export core types
pub use volum_core::{
    evaluate, Bounds, ColorChannel, ColorRamp, ColorSource, ComputePath, CpuGlyphs, DispatchPolicy,
    FieldDescriptor, FieldOutput, FieldStatistics, GlyphGeometry, GlyphOutput, GlyphStyle, GpuGlyphs,
    GridShape, GridTransform, IsoSurface, MaterialHandle, MaterialKind, Result, ScalarFieldDescriptor,
    ScalarOutput, TriangleMesh, VectorFieldDescriptor, VisualizationOptions, VolumError,
};
pub use volum_core::{Mat4, Quat, Vec3};

/// Rendering side: WGSL generation and wgpu resources.
pub use volum_render as render;

pub use scene::{ObjectRequest, PrimitiveKind, PrimitiveRequest, Scene, SceneOutputs, VectorFieldRequest};

/// Visualizes one field with a policy built from `options`.
pub fn visualize(field: &FieldDescriptor, options: &VisualizationOptions) -> Result<FieldOutput> {
    DispatchPolicy::from_options(options).visualize(field)
}

/// Visualizes a batch of independent fields. Results keep the input order.
pub fn visualize_all(fields: &[FieldDescriptor], options: &VisualizationOptions) -> Vec<Result<FieldOutput>> {
    let policy = DispatchPolicy::from_options(options);
    log::debug!("visualizing {} fields", fields.len());
    map_requests(fields, |field| policy.visualize(field))
}

/// Loads a scene document and visualizes its fields.
pub fn visualize_scene(json: &str, options: &VisualizationOptions) -> Result<(Scene, SceneOutputs)> {
    let scene = Scene::from_json(json, options)?;
    let outputs = scene.visualize(&DispatchPolicy::from_options(options));
    Ok((scene, outputs))
}

#[cfg(feature = "parallel")]
pub(crate) fn map_requests<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn map_requests<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}
