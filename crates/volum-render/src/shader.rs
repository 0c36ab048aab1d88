//! Shader management and WGSL generation.
//!
//! The glyph shader resolves length remapping, orientation and colormap
//! lookup per instance. Its normalization functions come from
//! [`volum_core::normalization::WGSL`] and its colormap from the same control
//! tables the CPU path samples, so both paths draw the same picture.

use volum_core::color_map::CONTROL_POINTS;
use volum_core::{normalization, ColorRamp};

use crate::error::{RenderError, RenderResult};

/// Builder for creating shader modules.
pub struct ShaderBuilder {
    vertex_source: Option<String>,
    fragment_source: Option<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a new shader builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex_source: None,
            fragment_source: None,
            label: None,
        }
    }

    /// Uses one WGSL source for both stages.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        self.vertex_source = Some(source.clone());
        self.fragment_source = Some(source);
        self
    }

    /// Sets the vertex shader source (WGSL).
    pub fn with_vertex(mut self, source: impl Into<String>) -> Self {
        self.vertex_source = Some(source.into());
        self
    }

    /// Sets the fragment shader source (WGSL).
    pub fn with_fragment(mut self, source: impl Into<String>) -> Self {
        self.fragment_source = Some(source.into());
        self
    }

    /// Sets the shader label for debugging.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds the shader module (does not create pipeline).
    pub fn build_module(self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.combined_source()?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Ok(module)
    }

    /// The WGSL that [`ShaderBuilder::build_module`] would compile.
    pub fn combined_source(&self) -> RenderResult<String> {
        let vertex = self
            .vertex_source
            .as_ref()
            .ok_or_else(|| RenderError::ShaderCompilationFailed("missing vertex shader".into()))?;

        let fragment = self.fragment_source.as_ref().ok_or_else(|| {
            RenderError::ShaderCompilationFailed("missing fragment shader".into())
        })?;

        // If sources are the same file, just return one
        if vertex == fragment {
            return Ok(vertex.clone());
        }

        Ok(format!("{vertex}\n\n{fragment}"))
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// WGSL function `volum_colormap(t: f32) -> vec3<f32>` evaluating `ramp`.
///
/// Mirrors [`ColorRamp::sample`]: clamp, pick the bracket, mix.
#[must_use]
pub fn ramp_wgsl(ramp: ColorRamp) -> String {
    let colors: String = ramp
        .colors()
        .iter()
        .map(|c| format!("        vec3<f32>({:?}, {:?}, {:?}),\n", c.x, c.y, c.z))
        .collect();
    let segments = CONTROL_POINTS - 1;
    let last_bracket = CONTROL_POINTS - 2;

    format!(
        "// {name} colormap
fn volum_colormap(t_in: f32) -> vec3<f32> {{
    var colors = array<vec3<f32>, {CONTROL_POINTS}>(
{colors}    );
    let t = clamp(t_in, 0.0, 1.0);
    let scaled = t * {segments}.0;
    let idx = min(u32(floor(scaled)), {last_bracket}u);
    let frac = scaled - f32(idx);
    return mix(colors[idx], colors[idx + 1u], vec3<f32>(frac));
}}
",
        name = ramp.name(),
    )
}

const GLYPH_SHADER: &str = r"
struct Camera {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
}

struct GlyphUniforms {
    min_magnitude: f32,
    max_magnitude: f32,
    min_length: f32,
    max_length: f32,
}

struct GlyphInstance {
    position: vec3<f32>,
    color_scalar: f32,
    direction: vec3<f32>,
    padding: f32,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> glyph: GlyphUniforms;
@group(0) @binding(2) var<storage, read> instances: array<GlyphInstance>;
@group(0) @binding(3) var<storage, read> glyph_positions: array<vec4<f32>>;
@group(0) @binding(4) var<storage, read> glyph_normals: array<vec4<f32>>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color_scalar: f32,
}

// shortest-arc rotation taking +z onto the unit vector dir
fn forward_rotation(dir: vec3<f32>) -> vec4<f32> {
    if (dir.z < -0.9999995) {
        return vec4<f32>(0.0, 1.0, 0.0, 0.0);
    }
    if (dir.z > 0.9999995) {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }
    return normalize(vec4<f32>(-dir.y, dir.x, 0.0, 1.0 + dir.z));
}

fn rotate(q: vec4<f32>, v: vec3<f32>) -> vec3<f32> {
    let u = cross(q.xyz, v) + q.w * v;
    return v + 2.0 * cross(q.xyz, u);
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    let instance = instances[instance_index];
    let raw_length = length(instance.direction);
    let magnitude = volum_normalize(raw_length, glyph.min_magnitude, glyph.max_magnitude);

    var scale = volum_remap_length(magnitude, glyph.min_length, glyph.max_length);
    var q = vec4<f32>(0.0, 0.0, 0.0, 1.0);
    if (raw_length > 0.0) {
        q = forward_rotation(instance.direction / raw_length);
    } else {
        scale = 0.0;
    }

    let local = glyph_positions[vertex_index].xyz * scale;
    let world = instance.position + rotate(q, local);

    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(world, 1.0);
    out.world_normal = rotate(q, glyph_normals[vertex_index].xyz);
    out.color_scalar = instance.color_scalar;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 0.8, 0.5));
    let n = normalize(input.world_normal);
    let diffuse = 0.35 + 0.65 * max(dot(n, light_dir), 0.0);
    return vec4<f32>(volum_colormap(input.color_scalar) * diffuse, 1.0);
}
";

/// Complete glyph instancing shader coloring with `ramp`.
#[must_use]
pub fn glyph_shader_source(ramp: ColorRamp) -> String {
    format!("{}\n{}\n{GLYPH_SHADER}", normalization::WGSL, ramp_wgsl(ramp))
}

const ISOSURFACE_SHADER: &str = r"
struct Camera {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
}

struct IsosurfaceUniforms {
    model: mat4x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> surface: IsosurfaceUniforms;
@group(0) @binding(2) var<storage, read> positions: array<vec4<f32>>;
@group(0) @binding(3) var<storage, read> normals: array<vec4<f32>>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * surface.model * positions[vertex_index];
    out.world_normal = (surface.model * normals[vertex_index]).xyz;
    return out;
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.3, 0.8, 0.5));
    var n = normalize(input.world_normal);
    if (!front) {
        n = -n;
    }
    let diffuse = 0.35 + 0.65 * max(dot(n, light_dir), 0.0);
    return vec4<f32>(surface.color.rgb * diffuse, surface.color.a);
}
";

/// Shader for world-space isosurface meshes with a flat color.
#[must_use]
pub fn isosurface_shader_source() -> &'static str {
    ISOSURFACE_SHADER
}
