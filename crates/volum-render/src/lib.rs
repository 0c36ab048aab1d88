//! Rendering side of volum.
//!
//! This crate turns the output of `volum-core` into wgpu resources:
//! - WGSL generation for the colormap ramps and the glyph instancing shader
//! - Glyph resources for the GPU-deferred vector path
//! - Isosurface resources for extracted meshes

pub mod camera;
pub mod error;
pub mod glyph_render;
pub mod isosurface_render;
pub mod shader;

pub use camera::CameraUniforms;
pub use error::{RenderError, RenderResult};
pub use glyph_render::{create_glyph_bind_group_layout, create_glyph_pipeline, expand_mesh, GlyphRenderData};
pub use isosurface_render::{
    create_isosurface_bind_group_layout, create_isosurface_pipeline, IsosurfaceRenderData,
    IsosurfaceUniforms,
};
pub use shader::{glyph_shader_source, isosurface_shader_source, ramp_wgsl, ShaderBuilder};
