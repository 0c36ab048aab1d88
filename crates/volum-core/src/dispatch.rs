//! Routes a validated field to the isosurface extractor or the glyph builder.
//!
//! Vector fields with more instances than
//! [`DispatchPolicy::gpu_instance_threshold`] leave orientation, length
//! remapping and colormap lookup to the shader; smaller ones are resolved on
//! the CPU. The threshold is a tunable, not an architectural limit.

use glam::Vec3;

use crate::error::Result;
use crate::field::{ColorSource, FieldDescriptor, ScalarFieldDescriptor, VectorFieldDescriptor};
use crate::glyph::{self, CpuGlyphs, GpuGlyphs};
use crate::options::{VisualizationOptions, DEFAULT_GPU_INSTANCE_THRESHOLD};
use crate::statistics::FieldStatistics;
use crate::surface_nets::{self, GridTransform, IsoSurface};

/// Where per-instance glyph math runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputePath {
    Cpu,
    Gpu,
}

/// Size-based choice between the CPU and GPU-deferred glyph paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    pub gpu_instance_threshold: usize,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            gpu_instance_threshold: DEFAULT_GPU_INSTANCE_THRESHOLD,
        }
    }
}

/// Glyphs produced by either path.
#[derive(Debug, Clone)]
pub enum GlyphOutput {
    Cpu(CpuGlyphs),
    Gpu(GpuGlyphs),
}

impl GlyphOutput {
    #[must_use]
    pub fn path(&self) -> ComputePath {
        match self {
            GlyphOutput::Cpu(_) => ComputePath::Cpu,
            GlyphOutput::Gpu(_) => ComputePath::Gpu,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            GlyphOutput::Cpu(glyphs) => glyphs.len(),
            GlyphOutput::Gpu(glyphs) => glyphs.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Isosurfaces of a scalar field, one per requested level.
#[derive(Debug, Clone)]
pub struct ScalarOutput {
    /// World-space surfaces in level order; a level without crossings has an empty mesh.
    pub surfaces: Vec<IsoSurface>,
    /// Range of the finite field values.
    pub statistics: FieldStatistics,
    pub color: ColorSource,
}

impl ScalarOutput {
    /// Ramp color of a level, relative to the field's value range.
    #[must_use]
    pub fn level_color(&self, level: f32) -> Option<Vec3> {
        self.color
            .ramp()
            .map(|ramp| ramp.sample(self.statistics.normalize(level)))
    }

    /// Surfaces that actually contain triangles.
    pub fn non_empty(&self) -> impl Iterator<Item = &IsoSurface> {
        self.surfaces.iter().filter(|s| !s.mesh.is_empty())
    }
}

/// Result of one visualization request.
#[derive(Debug, Clone)]
pub enum FieldOutput {
    Isosurfaces(ScalarOutput),
    Glyphs(GlyphOutput),
}

impl DispatchPolicy {
    /// Creates a policy with an explicit threshold.
    #[must_use]
    pub fn new(gpu_instance_threshold: usize) -> Self {
        Self {
            gpu_instance_threshold,
        }
    }

    #[must_use]
    pub fn from_options(options: &VisualizationOptions) -> Self {
        Self::new(options.gpu_instance_threshold)
    }

    /// Counts strictly above the threshold take the GPU path.
    #[must_use]
    pub fn choose_path(&self, instance_count: usize) -> ComputePath {
        if instance_count > self.gpu_instance_threshold {
            ComputePath::Gpu
        } else {
            ComputePath::Cpu
        }
    }

    /// Extracts every level of `field` and maps the meshes to world space.
    pub fn visualize_scalar(&self, field: &ScalarFieldDescriptor) -> Result<ScalarOutput> {
        let shape = field.shape();
        let transform = GridTransform::new(&field.bounds(), &shape);
        let meshes = surface_nets::extract_levels(field.values(), shape, field.levels())?;

        let surfaces = field
            .levels()
            .iter()
            .zip(meshes)
            .map(|(&level, mesh)| {
                if mesh.is_empty() {
                    log::debug!("iso-level {level} does not cross the field");
                }
                IsoSurface {
                    level,
                    mesh: mesh.mapped(|p| transform.apply(p)),
                    grid_to_world: transform,
                }
            })
            .collect::<Vec<_>>();
        log::info!(
            "extracted {} isosurfaces from a {}x{}x{} grid",
            surfaces.len(),
            shape.nx,
            shape.ny,
            shape.nz
        );

        let statistics = FieldStatistics::from_values(field.values()).unwrap_or_else(|| {
            log::debug!("scalar field has no finite values");
            FieldStatistics { min: 0.0, max: 0.0 }
        });

        Ok(ScalarOutput {
            surfaces,
            statistics,
            color: field.color().clone(),
        })
    }

    /// Builds glyphs on the path chosen for the field's instance count.
    #[must_use]
    pub fn visualize_vector(&self, field: &VectorFieldDescriptor) -> GlyphOutput {
        let path = self.choose_path(field.len());
        log::info!("building {} glyphs on the {path:?} path", field.len());
        match path {
            ComputePath::Cpu => GlyphOutput::Cpu(glyph::build_cpu(field)),
            ComputePath::Gpu => GlyphOutput::Gpu(glyph::build_gpu(field)),
        }
    }

    pub fn visualize(&self, field: &FieldDescriptor) -> Result<FieldOutput> {
        match field {
            FieldDescriptor::Scalar(field) => self.visualize_scalar(field).map(FieldOutput::Isosurfaces),
            FieldDescriptor::Vector(field) => Ok(FieldOutput::Glyphs(self.visualize_vector(field))),
        }
    }
}
