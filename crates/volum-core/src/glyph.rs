//! Vector glyph instancing.
//!
//! A vector field is drawn as one glyph instance per sample. Each instance is
//! placed at the sample position, rotated so the glyph's forward axis
//! ([`GLYPH_FORWARD`]) follows the vector, and uniformly scaled to a visual
//! length remapped from the normalized vector magnitude.
//!
//! Two output shapes exist. [`CpuGlyphs`] holds ready-made instance matrices
//! and color scalars. [`GpuGlyphs`] holds the raw instance attributes and
//! leaves length remapping, orientation and colormap lookup to the shader.
//! Both paths read their formulas from [`crate::normalization`], so they
//! produce the same picture.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};

use crate::color_map::ColorRamp;
use crate::field::{Bounds, ColorChannel, ColorSource, GlyphStyle, VectorFieldDescriptor};
use crate::mesh::TriangleMesh;
use crate::normalization;
use crate::statistics::FieldStatistics;

/// Local axis of the base glyph that points along the vector.
pub const GLYPH_FORWARD: Vec3 = Vec3::Z;

/// Per-instance attributes of the GPU-deferred path.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphInstance {
    /// Sample position.
    pub position: [f32; 3],
    /// Color scalar chosen by the color channel.
    pub color_scalar: f32,
    /// Raw sample vector, before length remapping.
    pub direction: [f32; 3],
    pub _padding: f32,
}

/// Values the glyph shader needs to remap raw vector lengths.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphUniforms {
    pub min_magnitude: f32,
    pub max_magnitude: f32,
    pub min_length: f32,
    pub max_length: f32,
}

impl GlyphUniforms {
    /// Uniforms for a field with the given magnitude range and style.
    #[must_use]
    pub fn new(stats: &FieldStatistics, style: &GlyphStyle) -> Self {
        Self {
            min_magnitude: stats.min,
            max_magnitude: stats.max,
            min_length: style.min_length,
            max_length: style.max_length,
        }
    }
}

/// Glyph instances computed entirely on the CPU.
#[derive(Debug, Clone, Default)]
pub struct CpuGlyphs {
    /// Instance matrices (translation * rotation * uniform scale).
    pub transforms: Vec<Mat4>,
    /// Normalized vector magnitudes in `[0, 1]`.
    pub magnitudes: Vec<f32>,
    /// Per-instance color scalars.
    pub color_scalars: Vec<f32>,
    /// Ramp colors, present when the color source is a named ramp.
    pub colors: Option<Vec<Vec3>>,
}

impl CpuGlyphs {
    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// A glyph instance resolved from GPU attributes, as the shader sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGlyph {
    pub transform: Mat4,
    pub magnitude: f32,
    pub color_scalar: f32,
}

/// Raw glyph attributes for the GPU-deferred path.
#[derive(Debug, Clone)]
pub struct GpuGlyphs {
    pub instances: Vec<GlyphInstance>,
    pub uniforms: GlyphUniforms,
    pub color: ColorSource,
}

impl GpuGlyphs {
    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Evaluates instance `index` the way the glyph shader does.
    #[must_use]
    pub fn resolve(&self, index: usize) -> Option<ResolvedGlyph> {
        let instance = self.instances.get(index)?;
        let u = &self.uniforms;
        let vector = Vec3::from(instance.direction);
        let magnitude = normalization::normalize(vector.length(), u.min_magnitude, u.max_magnitude);
        let length = normalization::remap_length(magnitude, u.min_length, u.max_length);
        Some(ResolvedGlyph {
            transform: instance_transform(Vec3::from(instance.position), vector, length),
            magnitude,
            color_scalar: instance.color_scalar,
        })
    }
}

/// Builds the instance matrix of one glyph.
///
/// A zero vector has no direction; its glyph collapses to scale zero.
#[must_use]
pub fn instance_transform(position: Vec3, vector: Vec3, visual_length: f32) -> Mat4 {
    let raw_length = vector.length();
    if raw_length == 0.0 {
        return Mat4::from_scale_rotation_translation(Vec3::ZERO, Quat::IDENTITY, position);
    }
    let rotation = Quat::from_rotation_arc(GLYPH_FORWARD, vector / raw_length);
    Mat4::from_scale_rotation_translation(Vec3::splat(visual_length), rotation, position)
}

/// Color scalar of one sample for `channel`.
#[must_use]
pub fn color_scalar(channel: ColorChannel, bounds: &Bounds, position: Vec3, magnitude: f32) -> f32 {
    match channel.axis() {
        Some(axis) => bounds.axis_fraction(position, axis),
        None => magnitude,
    }
}

fn magnitude_statistics(field: &VectorFieldDescriptor) -> FieldStatistics {
    let stats = FieldStatistics::from_magnitudes(field.vectors()).unwrap_or_else(|| {
        log::debug!("no finite vector magnitudes, treating range as empty");
        FieldStatistics { min: 0.0, max: 0.0 }
    });
    if stats.is_degenerate() {
        log::debug!(
            "all {} vectors have magnitude {}, normalized magnitudes are 0",
            field.len(),
            stats.min
        );
    }
    stats
}

/// Computes instance matrices and color scalars for every sample.
#[must_use]
pub fn build_cpu(field: &VectorFieldDescriptor) -> CpuGlyphs {
    let stats = magnitude_statistics(field);
    let style = field.style();
    let bounds = field.bounds();

    let mut glyphs = CpuGlyphs {
        transforms: Vec::with_capacity(field.len()),
        magnitudes: Vec::with_capacity(field.len()),
        color_scalars: Vec::with_capacity(field.len()),
        colors: None,
    };

    for sample in field.samples() {
        let magnitude = stats.normalize(sample.vector.length());
        let length = normalization::remap_length(magnitude, style.min_length, style.max_length);
        glyphs
            .transforms
            .push(instance_transform(sample.position, sample.vector, length));
        glyphs.magnitudes.push(magnitude);
        glyphs
            .color_scalars
            .push(color_scalar(style.channel, &bounds, sample.position, magnitude));
    }

    glyphs.colors = field
        .color()
        .ramp()
        .map(|ramp| ramp_colors(ramp, &glyphs.color_scalars));
    glyphs
}

/// Packs raw instance attributes; remapping and orientation happen in the shader.
#[must_use]
pub fn build_gpu(field: &VectorFieldDescriptor) -> GpuGlyphs {
    let stats = magnitude_statistics(field);
    let style = field.style();
    let bounds = field.bounds();

    let instances = field
        .samples()
        .map(|sample| {
            let magnitude = stats.normalize(sample.vector.length());
            GlyphInstance {
                position: sample.position.to_array(),
                color_scalar: color_scalar(style.channel, &bounds, sample.position, magnitude),
                direction: sample.vector.to_array(),
                _padding: 0.0,
            }
        })
        .collect();

    GpuGlyphs {
        instances,
        uniforms: GlyphUniforms::new(&stats, &style),
        color: field.color().clone(),
    }
}

fn ramp_colors(ramp: ColorRamp, scalars: &[f32]) -> Vec<Vec3> {
    scalars.iter().map(|&t| ramp.sample(t)).collect()
}

/// Base geometry instanced once per vector sample.
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphGeometry {
    /// A cone along [`GLYPH_FORWARD`].
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    /// A primitive object description, built by the renderer.
    Object(serde_json::Value),
}

impl Default for GlyphGeometry {
    fn default() -> Self {
        GlyphGeometry::Cone {
            radius: 1.0,
            height: 3.0,
            radial_segments: 3,
        }
    }
}

impl GlyphGeometry {
    /// Triangle mesh of a built-in glyph; `None` for caller-described objects.
    #[must_use]
    pub fn mesh(&self) -> Option<TriangleMesh> {
        match *self {
            GlyphGeometry::Cone {
                radius,
                height,
                radial_segments,
            } => Some(Self::cone(radius, height, radial_segments)),
            GlyphGeometry::Object(_) => None,
        }
    }

    /// A cone pointing along [`GLYPH_FORWARD`], centered at the origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> TriangleMesh {
        let segments = radial_segments.max(3);
        let mut positions = Vec::with_capacity(segments as usize + 2);
        let mut triangles = Vec::with_capacity(segments as usize * 2);

        let apex = 0_u32;
        let base_center = 1_u32;
        positions.push(Vec3::new(0.0, 0.0, height));
        positions.push(Vec3::ZERO);
        for i in 0..segments {
            let angle = TAU * i as f32 / segments as f32;
            positions.push(Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0));
        }

        for i in 0..segments {
            let a = 2 + i;
            let b = 2 + (i + 1) % segments;
            triangles.push([a, b, apex]);
            triangles.push([b, a, base_center]);
        }

        TriangleMesh::new(positions, triangles).recentered()
    }
}
