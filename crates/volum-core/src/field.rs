//! Field descriptors: the validated input of a visualization request.
//!
//! A descriptor is built once per request, consumed by the dispatch policy and
//! dropped afterwards. Construction performs every validation check, so the
//! extractors and builders never see inconsistent input.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color_map::ColorRamp;
use crate::error::{Result, VolumError};
use crate::normalization;

/// Dimensions of a structured grid (number of nodes per axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
}

impl GridShape {
    /// Creates a shape; every dimension must be positive and the node count
    /// must fit in `usize`.
    pub fn new(nx: u32, ny: u32, nz: u32) -> Result<Self> {
        let nodes = (nx as usize)
            .checked_mul(ny as usize)
            .and_then(|n| n.checked_mul(nz as usize));
        if nx == 0 || ny == 0 || nz == 0 || nodes.is_none() {
            return Err(VolumError::InvalidShape(vec![
                i64::from(nx),
                i64::from(ny),
                i64::from(nz),
            ]));
        }
        Ok(Self { nx, ny, nz })
    }

    /// Creates a shape from 2 or 3 signed dimensions, as found in object
    /// descriptions. A 2D shape gets `nz = 1`.
    pub fn from_dims(dims: &[i64]) -> Result<Self> {
        let invalid = || VolumError::InvalidShape(dims.to_vec());
        let dim = |d: i64| u32::try_from(d).ok().filter(|&d| d > 0).ok_or_else(invalid);
        match *dims {
            [nx, ny] => Self::new(dim(nx)?, dim(ny)?, 1),
            [nx, ny, nz] => Self::new(dim(nx)?, dim(ny)?, dim(nz)?),
            _ => Err(invalid()),
        }
    }

    /// Guesses a cubic shape `n x n x n` from a flattened length.
    ///
    /// Only succeeds when `len` is an exact cube. Callers should prefer an
    /// explicit shape; non-cubic data cannot be recovered from its length.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn infer_cubic(len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let guess = (len as f64).cbrt().round() as usize;
        // cbrt rounding can land one off for large inputs
        (guess.saturating_sub(1)..=guess + 1)
            .find(|n| n.checked_pow(3) == Some(len))
            .and_then(|n| u32::try_from(n).ok())
            .map(|n| Self { nx: n, ny: n, nz: n })
    }

    /// Number of grid nodes.
    ///
    /// Exact for shapes built by [`GridShape::new`]; a hand-built shape too
    /// large for `usize` saturates, so it never matches a real value count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        (self.nx as usize)
            .saturating_mul(self.ny as usize)
            .saturating_mul(self.nz as usize)
    }

    /// Number of grid cells (zero when any axis has a single node).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let cells = |n: u32| (n as usize).saturating_sub(1);
        cells(self.nx)
            .saturating_mul(cells(self.ny))
            .saturating_mul(cells(self.nz))
    }

    /// Linear index of node `(x, y, z)`; x varies fastest.
    #[inline]
    #[must_use]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.nx as usize * (y + self.ny as usize * z)
    }

    /// Inverse of [`GridShape::index`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn coords(&self, index: usize) -> [u32; 3] {
        let nx = self.nx as usize;
        let ny = self.ny as usize;
        [
            (index % nx) as u32,
            ((index / nx) % ny) as u32,
            (index / (nx * ny)) as u32,
        ]
    }

    /// The dimensions as a float vector.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.nx as f32, self.ny as f32, self.nz as f32)
    }
}

/// Axis-aligned world-space box of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Bounds {
    /// The unit box `(0,0,0)..(1,1,1)`.
    pub const UNIT: Bounds = Bounds {
        min: Vec3::ZERO,
        max: Vec3::ONE,
    };

    /// Creates bounds from two corners.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates bounds from `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub fn from_slice(values: &[f32]) -> Result<Self> {
        match *values {
            [x0, y0, z0, x1, y1, z1] => Ok(Self::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))),
            _ => Err(VolumError::SizeMismatch {
                expected: 6,
                actual: values.len(),
            }),
        }
    }

    /// Smallest box containing every point; `None` for no points.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { min, max })
    }

    /// `max - min` per axis.
    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Relative position of `point` along `axis` (0 = x, 1 = y, 2 = z).
    #[must_use]
    pub fn axis_fraction(&self, point: Vec3, axis: usize) -> f32 {
        normalization::axis_fraction(point[axis], self.min[axis], self.max[axis])
    }
}

/// What drives the per-instance color scalar of a vector glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChannel {
    /// Normalized vector magnitude.
    #[default]
    Magnitude,
    /// Relative x position within the bounds.
    X,
    /// Relative y position within the bounds.
    Y,
    /// Relative z position within the bounds.
    Z,
}

impl ColorChannel {
    /// Parses a channel name (case-insensitive). `"height"` is an alias of `y`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "magnitude" => Some(ColorChannel::Magnitude),
            "x" => Some(ColorChannel::X),
            "y" | "height" => Some(ColorChannel::Y),
            "z" => Some(ColorChannel::Z),
            _ => None,
        }
    }

    /// Parses a channel name, falling back to magnitude for unknown names.
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown color channel '{name}', using magnitude");
            ColorChannel::Magnitude
        })
    }

    /// Bounds axis of a positional channel.
    #[must_use]
    pub fn axis(self) -> Option<usize> {
        match self {
            ColorChannel::Magnitude => None,
            ColorChannel::X => Some(0),
            ColorChannel::Y => Some(1),
            ColorChannel::Z => Some(2),
        }
    }
}

/// Material types a caller may hand over instead of a named ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    BasicMaterial,
    StandardMaterial,
    PhongMaterial,
    LineBasicMaterial,
    LineDashedMaterial,
    PhysicalMaterial,
    MatcapMaterial,
    NormalMaterial,
    ToonMaterial,
    ImageMaterial,
}

impl MaterialKind {
    const ALL: [MaterialKind; 10] = [
        MaterialKind::BasicMaterial,
        MaterialKind::StandardMaterial,
        MaterialKind::PhongMaterial,
        MaterialKind::LineBasicMaterial,
        MaterialKind::LineDashedMaterial,
        MaterialKind::PhysicalMaterial,
        MaterialKind::MatcapMaterial,
        MaterialKind::NormalMaterial,
        MaterialKind::ToonMaterial,
        MaterialKind::ImageMaterial,
    ];

    /// Type tag used in object descriptions.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MaterialKind::BasicMaterial => "BasicMaterial",
            MaterialKind::StandardMaterial => "StandardMaterial",
            MaterialKind::PhongMaterial => "PhongMaterial",
            MaterialKind::LineBasicMaterial => "LineBasicMaterial",
            MaterialKind::LineDashedMaterial => "LineDashedMaterial",
            MaterialKind::PhysicalMaterial => "PhysicalMaterial",
            MaterialKind::MatcapMaterial => "MatcapMaterial",
            MaterialKind::NormalMaterial => "NormalMaterial",
            MaterialKind::ToonMaterial => "ToonMaterial",
            MaterialKind::ImageMaterial => "ImageMaterial",
        }
    }

    /// Looks a material type up by its tag.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| VolumError::UnknownMaterial(name.to_string()))
    }
}

/// A caller-built material. The core never looks inside `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialHandle {
    pub kind: MaterialKind,
    #[serde(default)]
    pub properties: serde_json::Value,
}

/// How a field is colored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorSource {
    /// Procedural per-instance color from a named ramp.
    NamedRamp(ColorRamp),
    /// A material supplied by the caller, used as-is.
    ExplicitMaterial(MaterialHandle),
}

impl Default for ColorSource {
    fn default() -> Self {
        ColorSource::NamedRamp(ColorRamp::default())
    }
}

impl ColorSource {
    /// Named ramp from a string; unknown names fall back to viridis.
    pub fn ramp_named(name: &str) -> Self {
        ColorSource::NamedRamp(ColorRamp::resolve(name))
    }

    /// The ramp, if this source is procedural.
    #[must_use]
    pub fn ramp(&self) -> Option<ColorRamp> {
        match self {
            ColorSource::NamedRamp(ramp) => Some(*ramp),
            ColorSource::ExplicitMaterial(_) => None,
        }
    }
}

/// Visual length range and color channel of vector glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphStyle {
    pub min_length: f32,
    pub max_length: f32,
    pub channel: ColorChannel,
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            min_length: 0.1,
            max_length: 1.0,
            channel: ColorChannel::Magnitude,
        }
    }
}

impl GlyphStyle {
    /// Checks `0 <= min_length <= max_length`.
    pub fn validate(&self) -> Result<()> {
        let ok = self.min_length >= 0.0 && self.max_length >= 0.0 && self.min_length <= self.max_length;
        if ok {
            Ok(())
        } else {
            Err(VolumError::InvalidLengthRange {
                min: self.min_length,
                max: self.max_length,
            })
        }
    }
}

/// One grid sample of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSample {
    pub index: [u32; 3],
    pub value: f32,
}

/// One sample of a vector field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorSample {
    pub position: Vec3,
    pub vector: Vec3,
}

/// A single field sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldSample {
    Scalar(ScalarSample),
    Vector(VectorSample),
}

/// A scalar field on a structured grid, plus the iso-levels to extract.
#[derive(Debug, Clone)]
pub struct ScalarFieldDescriptor {
    shape: GridShape,
    bounds: Bounds,
    values: Vec<f32>,
    levels: Vec<f32>,
    color: ColorSource,
}

impl ScalarFieldDescriptor {
    /// Validates and creates a scalar field descriptor.
    ///
    /// `values` must be non-empty and hold exactly `nx * ny * nz` samples in
    /// x-fastest order. `levels` may be empty.
    pub fn new(
        shape: GridShape,
        bounds: Bounds,
        values: Vec<f32>,
        levels: Vec<f32>,
        color: ColorSource,
    ) -> Result<Self> {
        if values.is_empty() {
            return Err(VolumError::EmptyField("values"));
        }
        if shape.node_count() != values.len() {
            return Err(VolumError::SizeMismatch {
                expected: shape.node_count(),
                actual: values.len(),
            });
        }
        Ok(Self {
            shape,
            bounds,
            values,
            levels,
            color,
        })
    }

    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[must_use]
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    #[must_use]
    pub fn color(&self) -> &ColorSource {
        &self.color
    }

    /// Iterates over the grid samples in storage order.
    pub fn samples(&self) -> impl Iterator<Item = ScalarSample> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &value)| ScalarSample {
                index: self.shape.coords(i),
                value,
            })
    }
}

/// Paired position/vector samples to be drawn as glyphs.
#[derive(Debug, Clone)]
pub struct VectorFieldDescriptor {
    positions: Vec<Vec3>,
    vectors: Vec<Vec3>,
    bounds: Bounds,
    /// Grid layout the samples came from, if the source described one.
    shape: Option<GridShape>,
    style: GlyphStyle,
    color: ColorSource,
}

impl VectorFieldDescriptor {
    /// Validates and creates a vector field descriptor.
    ///
    /// Positions and vectors must be non-empty and of equal length, and the
    /// glyph length range must be valid.
    pub fn new(
        positions: Vec<Vec3>,
        vectors: Vec<Vec3>,
        bounds: Bounds,
        style: GlyphStyle,
        color: ColorSource,
    ) -> Result<Self> {
        if positions.len() != vectors.len() {
            return Err(VolumError::LengthMismatch {
                positions: positions.len(),
                vectors: vectors.len(),
            });
        }
        if positions.is_empty() {
            return Err(VolumError::EmptyField("positions and vectors"));
        }
        style.validate()?;
        Ok(Self {
            positions,
            vectors,
            bounds,
            shape: None,
            style,
            color,
        })
    }

    /// Attaches the grid layout the samples were taken on.
    ///
    /// This is pass-through metadata for callers that want to rebuild the
    /// grid. Glyph building only reads positions and vectors, so the shape
    /// never changes the output.
    #[must_use]
    pub fn with_shape(mut self, shape: GridShape) -> Self {
        self.shape = Some(shape);
        self
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[must_use]
    pub fn vectors(&self) -> &[Vec3] {
        &self.vectors
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The layout given to [`VectorFieldDescriptor::with_shape`], if any.
    #[must_use]
    pub fn shape(&self) -> Option<GridShape> {
        self.shape
    }

    #[must_use]
    pub fn style(&self) -> GlyphStyle {
        self.style
    }

    #[must_use]
    pub fn color(&self) -> &ColorSource {
        &self.color
    }

    /// Number of glyph instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false for a validated descriptor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates over the position/vector pairs.
    pub fn samples(&self) -> impl Iterator<Item = VectorSample> + '_ {
        self.positions
            .iter()
            .zip(&self.vectors)
            .map(|(&position, &vector)| VectorSample { position, vector })
    }
}

/// A validated visualization request.
#[derive(Debug, Clone)]
pub enum FieldDescriptor {
    Scalar(ScalarFieldDescriptor),
    Vector(VectorFieldDescriptor),
}

impl FieldDescriptor {
    /// Number of samples in the field.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        match self {
            FieldDescriptor::Scalar(field) => field.values().len(),
            FieldDescriptor::Vector(field) => field.len(),
        }
    }

    /// Iterates over all samples.
    pub fn samples(&self) -> Box<dyn Iterator<Item = FieldSample> + '_> {
        match self {
            FieldDescriptor::Scalar(field) => Box::new(field.samples().map(FieldSample::Scalar)),
            FieldDescriptor::Vector(field) => Box::new(field.samples().map(FieldSample::Vector)),
        }
    }
}

impl From<ScalarFieldDescriptor> for FieldDescriptor {
    fn from(field: ScalarFieldDescriptor) -> Self {
        FieldDescriptor::Scalar(field)
    }
}

impl From<VectorFieldDescriptor> for FieldDescriptor {
    fn from(field: VectorFieldDescriptor) -> Self {
        FieldDescriptor::Vector(field)
    }
}

/// Splits a flat `[x0, y0, z0, x1, ...]` array into points.
pub fn vec3s_from_flat(flat: &[f32]) -> Result<Vec<Vec3>> {
    if flat.len() % 3 != 0 {
        return Err(VolumError::MalformedCoordinates(flat.len()));
    }
    Ok(flat
        .chunks_exact(3)
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}
