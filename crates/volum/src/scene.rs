//! Object-description boundary.
//!
//! A scene document is JSON of the form `{ "objects": [...] }` (a bare array
//! or a single object is accepted too). Every object carries a `type` tag
//! that is resolved once against [`builder_for`] into an [`ObjectRequest`].
//! Field objects (`Contour`, `Quiver`) are validated into core descriptors;
//! primitives, lights and transforms are passed through opaquely.

use serde::Deserialize;
use serde_json::Value;
use volum_core::{
    vec3s_from_flat, Bounds, ColorChannel, ColorSource, DispatchPolicy, FieldOutput, GlyphGeometry,
    GlyphStyle, GridShape, MaterialHandle, MaterialKind, Result, ScalarFieldDescriptor, Vec3,
    VectorFieldDescriptor, VisualizationOptions, VolumError,
};

/// Kinds of non-field objects a scene may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Box,
    Sphere,
    Plane,
    Cylinder,
    Line,
    Capsule,
    Circle,
    Cone,
    Dodecahedron,
    Icosahedron,
    Octahedron,
    Ring,
    Tetrahedron,
    Torus,
    TorusKnot,
    Pyramid,
    PointLight,
    DirectionalLight,
    SpotLight,
    Transform,
    PlotImage,
    Volume,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 22] = [
        PrimitiveKind::Box,
        PrimitiveKind::Sphere,
        PrimitiveKind::Plane,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Line,
        PrimitiveKind::Capsule,
        PrimitiveKind::Circle,
        PrimitiveKind::Cone,
        PrimitiveKind::Dodecahedron,
        PrimitiveKind::Icosahedron,
        PrimitiveKind::Octahedron,
        PrimitiveKind::Ring,
        PrimitiveKind::Tetrahedron,
        PrimitiveKind::Torus,
        PrimitiveKind::TorusKnot,
        PrimitiveKind::Pyramid,
        PrimitiveKind::PointLight,
        PrimitiveKind::DirectionalLight,
        PrimitiveKind::SpotLight,
        PrimitiveKind::Transform,
        PrimitiveKind::PlotImage,
        PrimitiveKind::Volume,
    ];

    /// The `type` tag of this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            PrimitiveKind::Box => "Box",
            PrimitiveKind::Sphere => "Sphere",
            PrimitiveKind::Plane => "Plane",
            PrimitiveKind::Cylinder => "Cylinder",
            PrimitiveKind::Line => "Line",
            PrimitiveKind::Capsule => "Capsule",
            PrimitiveKind::Circle => "Circle",
            PrimitiveKind::Cone => "Cone",
            PrimitiveKind::Dodecahedron => "Dodecahedron",
            PrimitiveKind::Icosahedron => "Icosahedron",
            PrimitiveKind::Octahedron => "Octahedron",
            PrimitiveKind::Ring => "Ring",
            PrimitiveKind::Tetrahedron => "Tetrahedron",
            PrimitiveKind::Torus => "Torus",
            PrimitiveKind::TorusKnot => "TorusKnot",
            PrimitiveKind::Pyramid => "Pyramid",
            PrimitiveKind::PointLight => "PointLight",
            PrimitiveKind::DirectionalLight => "DirectionalLight",
            PrimitiveKind::SpotLight => "SpotLight",
            PrimitiveKind::Transform => "Transform",
            PrimitiveKind::PlotImage => "PlotImage",
            PrimitiveKind::Volume => "Volume",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Lights and transforms carry no material.
    #[must_use]
    pub fn takes_material(self) -> bool {
        !matches!(
            self,
            PrimitiveKind::PointLight
                | PrimitiveKind::DirectionalLight
                | PrimitiveKind::SpotLight
                | PrimitiveKind::Transform
        )
    }
}

/// An opaque primitive; building its geometry is the renderer's job.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveRequest {
    pub kind: PrimitiveKind,
    pub material: Option<MaterialHandle>,
    /// The full object description.
    pub properties: Value,
}

/// A vector field and the glyph drawn for each of its samples.
#[derive(Debug, Clone)]
pub struct VectorFieldRequest {
    pub field: VectorFieldDescriptor,
    pub glyph: GlyphGeometry,
}

/// One resolved scene object.
#[derive(Debug, Clone)]
pub enum ObjectRequest {
    ScalarField(ScalarFieldDescriptor),
    VectorField(VectorFieldRequest),
    Primitive(PrimitiveRequest),
}

impl ObjectRequest {
    /// Runs field requests through `policy`; `None` for primitives.
    pub fn visualize(&self, policy: &DispatchPolicy) -> Option<Result<FieldOutput>> {
        match self {
            ObjectRequest::ScalarField(field) => {
                Some(policy.visualize_scalar(field).map(FieldOutput::Isosurfaces))
            }
            ObjectRequest::VectorField(request) => {
                Some(Ok(FieldOutput::Glyphs(policy.visualize_vector(&request.field))))
            }
            ObjectRequest::Primitive(_) => None,
        }
    }
}

/// Builds an [`ObjectRequest`] from an object description.
pub type Builder = fn(&Value, &VisualizationOptions) -> Result<ObjectRequest>;

const FIELD_BUILDERS: [(&str, Builder); 2] = [("Contour", build_contour), ("Quiver", build_quiver)];

/// Looks up the builder for an object `type` tag.
pub fn builder_for(tag: &str) -> Option<Builder> {
    FIELD_BUILDERS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, builder)| *builder)
        .or_else(|| PrimitiveKind::from_tag(tag).map(|_| build_primitive as Builder))
}

/// Resolves and validates a single object description.
pub fn parse_object(object: &Value, options: &VisualizationOptions) -> Result<ObjectRequest> {
    let tag = object.get("type").and_then(Value::as_str).unwrap_or_default();
    let builder = builder_for(tag).ok_or_else(|| VolumError::UnsupportedObject(tag.to_string()))?;
    builder(object, options)
}

/// Per-request results of [`Scene::visualize`]; `None` for primitives.
pub type SceneOutputs = Vec<Option<Result<FieldOutput>>>;

/// A loaded scene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub requests: Vec<ObjectRequest>,
    /// Objects that failed validation and were left out.
    pub skipped: usize,
}

impl Scene {
    /// Parses a scene document. Objects that fail validation are skipped with
    /// a warning; malformed JSON fails the whole load.
    pub fn from_json(json: &str, options: &VisualizationOptions) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        let objects = match document {
            Value::Object(mut map) => match map.remove("objects") {
                Some(Value::Array(objects)) => objects,
                Some(_) => Vec::new(),
                None => vec![Value::Object(map)],
            },
            Value::Array(objects) => objects,
            object => vec![object],
        };

        let mut scene = Scene::default();
        for (index, object) in objects.iter().enumerate() {
            match parse_object(object, options) {
                Ok(request) => scene.requests.push(request),
                Err(err) => {
                    log::warn!("skipping scene object {index}: {err}");
                    scene.skipped += 1;
                }
            }
        }
        log::info!(
            "loaded {} scene objects ({} skipped)",
            scene.requests.len(),
            scene.skipped
        );
        Ok(scene)
    }

    /// Visualizes every field request. Primitives yield `None`.
    pub fn visualize(&self, policy: &DispatchPolicy) -> SceneOutputs {
        crate::map_requests(&self.requests, |request| request.visualize(policy))
    }
}

/// Flat `[x0, y0, z0, ...]` or nested `[[x, y, z], ...]` coordinates.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinates {
    Flat(Vec<f32>),
    Nested(Vec<[f32; 3]>),
}

impl Coordinates {
    fn into_points(self) -> Result<Vec<Vec3>> {
        match self {
            Coordinates::Flat(flat) => vec3s_from_flat(&flat),
            Coordinates::Nested(points) => Ok(points.into_iter().map(Vec3::from).collect()),
        }
    }
}

/// Scalar values, flat or as single-value rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Values {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

impl Values {
    fn into_flat(self) -> Vec<f32> {
        match self {
            Values::Flat(values) => values,
            Values::Nested(rows) => rows.into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContourDescription {
    args: (Coordinates, Values),
    shape: Option<Vec<i64>>,
    bounds: Option<Vec<f32>>,
    #[serde(default)]
    levels: Vec<f32>,
    colorscheme: Option<String>,
    material: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QuiverDescription {
    args: Option<(Coordinates, Coordinates)>,
    points: Option<Coordinates>,
    vectors: Option<Coordinates>,
    shape: Option<Vec<i64>>,
    bounds: Option<Vec<f32>>,
    min_length: Option<f32>,
    max_length: Option<f32>,
    colormap: Option<String>,
    colorscheme: Option<String>,
    material: Option<Value>,
    object: Option<Value>,
}

fn material_handle(material: &Value) -> Result<MaterialHandle> {
    let tag = material.get("type").and_then(Value::as_str).unwrap_or_default();
    Ok(MaterialHandle {
        kind: MaterialKind::from_name(tag)?,
        properties: material.clone(),
    })
}

/// `colorscheme` wins over a material; with neither, the default ramp is used.
fn color_source(
    colorscheme: Option<&str>,
    material: Option<&Value>,
    options: &VisualizationOptions,
) -> Result<ColorSource> {
    if let Some(name) = colorscheme {
        return Ok(ColorSource::ramp_named(name));
    }
    match material {
        Some(material) => Ok(ColorSource::ExplicitMaterial(material_handle(material)?)),
        None => Ok(ColorSource::NamedRamp(options.default_ramp)),
    }
}

fn bounds_or_fit(bounds: Option<&[f32]>, points: &[Vec3]) -> Result<Bounds> {
    match bounds {
        Some(bounds) => Bounds::from_slice(bounds),
        None => Ok(Bounds::from_points(points).unwrap_or(Bounds::UNIT)),
    }
}

fn build_contour(object: &Value, options: &VisualizationOptions) -> Result<ObjectRequest> {
    let desc = ContourDescription::deserialize(object)?;
    let (positions, values) = desc.args;
    let positions = positions.into_points()?;
    let values = values.into_flat();

    let shape = GridShape::from_dims(&desc.shape.ok_or(VolumError::MissingShape)?)?;
    if !positions.is_empty() && positions.len() != values.len() {
        return Err(VolumError::SizeMismatch {
            expected: positions.len(),
            actual: values.len(),
        });
    }

    let bounds = bounds_or_fit(desc.bounds.as_deref(), &positions)?;
    let color = color_source(desc.colorscheme.as_deref(), desc.material.as_ref(), options)?;
    let field = ScalarFieldDescriptor::new(shape, bounds, values, desc.levels, color)?;
    Ok(ObjectRequest::ScalarField(field))
}

fn build_quiver(object: &Value, options: &VisualizationOptions) -> Result<ObjectRequest> {
    let desc = QuiverDescription::deserialize(object)?;
    let (positions, vectors) = match (desc.args, desc.points, desc.vectors) {
        (Some((positions, vectors)), _, _) | (None, Some(positions), Some(vectors)) => {
            (positions.into_points()?, vectors.into_points()?)
        }
        _ => return Err(VolumError::EmptyField("positions and vectors")),
    };

    let shape = desc.shape.as_deref().map(GridShape::from_dims).transpose()?;
    let bounds = bounds_or_fit(desc.bounds.as_deref(), &positions)?;

    let defaults = options.glyph_style();
    let style = GlyphStyle {
        min_length: desc.min_length.unwrap_or(defaults.min_length),
        max_length: desc.max_length.unwrap_or(defaults.max_length),
        channel: desc
            .colormap
            .as_deref()
            .map_or(defaults.channel, ColorChannel::resolve),
    };

    let glyph_material = desc.object.as_ref().and_then(|o| o.get("material")).filter(|m| !m.is_null());
    let color = color_source(
        desc.colorscheme.as_deref(),
        glyph_material.or(desc.material.as_ref()),
        options,
    )?;

    let glyph = match desc.object {
        Some(object) => {
            let tag = object.get("type").and_then(Value::as_str).unwrap_or_default();
            if PrimitiveKind::from_tag(tag).is_none() {
                return Err(VolumError::UnsupportedObject(tag.to_string()));
            }
            GlyphGeometry::Object(object)
        }
        None => GlyphGeometry::default(),
    };

    let mut field = VectorFieldDescriptor::new(positions, vectors, bounds, style, color)?;
    if let Some(shape) = shape {
        field = field.with_shape(shape);
    }
    Ok(ObjectRequest::VectorField(VectorFieldRequest { field, glyph }))
}

fn build_primitive(object: &Value, _options: &VisualizationOptions) -> Result<ObjectRequest> {
    let tag = object.get("type").and_then(Value::as_str).unwrap_or_default();
    let kind = PrimitiveKind::from_tag(tag).ok_or_else(|| VolumError::UnsupportedObject(tag.to_string()))?;
    let material = match object.get("material").filter(|m| !m.is_null()) {
        Some(material) if kind.takes_material() => Some(material_handle(material)?),
        _ => None,
    };
    Ok(ObjectRequest::Primitive(PrimitiveRequest {
        kind,
        material,
        properties: object.clone(),
    }))
}
