//! Vector glyph GPU rendering resources.
//!
//! Glyphs are drawn non-indexed and instanced: the base glyph mesh is
//! expanded to one vertex per triangle corner, and every instance reads its
//! attributes from a storage buffer by `instance_index`.

use std::num::NonZeroU64;

use glam::Vec3;
use volum_core::{ColorRamp, GlyphGeometry, GlyphInstance, GlyphUniforms, GpuGlyphs, TriangleMesh};
use wgpu::util::DeviceExt;

use crate::camera::CameraUniforms;
use crate::error::{RenderError, RenderResult};
use crate::shader::{glyph_shader_source, ShaderBuilder};

/// GPU resources for one glyph field.
pub struct GlyphRenderData {
    pub instance_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    /// Expanded glyph mesh positions (vec4 per triangle corner).
    pub glyph_position_buffer: wgpu::Buffer,
    /// Expanded glyph mesh normals (vec4 per triangle corner).
    pub glyph_normal_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub num_vertices: u32,
    pub num_instances: u32,
}

/// Expands an indexed mesh to per-corner vec4 positions and normals.
#[must_use]
pub fn expand_mesh(mesh: &TriangleMesh) -> (Vec<[f32; 4]>, Vec<[f32; 4]>) {
    let corners = mesh.triangles.len() * 3;
    let mut positions = Vec::with_capacity(corners);
    let mut normals = Vec::with_capacity(corners);
    for &vi in mesh.triangles.iter().flatten() {
        let p: Vec3 = mesh.positions[vi as usize];
        let n: Vec3 = mesh.normals[vi as usize];
        positions.push([p.x, p.y, p.z, 1.0]);
        normals.push([n.x, n.y, n.z, 0.0]);
    }
    (positions, normals)
}

fn uniform_entry(binding: u32, size: u64) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size),
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Bind group layout shared by all glyph fields.
///
/// Bindings:
/// 0: camera uniforms
/// 1: glyph uniforms
/// 2: instances (storage)
/// 3: glyph positions (storage)
/// 4: glyph normals (storage)
pub fn create_glyph_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("glyph bind group layout"),
        entries: &[
            uniform_entry(0, std::mem::size_of::<CameraUniforms>() as u64),
            uniform_entry(1, std::mem::size_of::<GlyphUniforms>() as u64),
            storage_entry(2),
            storage_entry(3),
            storage_entry(4),
        ],
    })
}

/// Render pipeline drawing glyphs colored with `ramp`.
pub fn create_glyph_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    ramp: ColorRamp,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
) -> RenderResult<wgpu::RenderPipeline> {
    let label = format!("glyph pipeline ({})", ramp.name());
    let shader = ShaderBuilder::new()
        .with_source(glyph_shader_source(ramp))
        .with_label(label.clone())
        .build_module(device)?;

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("glyph pipeline layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label.as_str()),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    }))
}

impl GlyphRenderData {
    /// Uploads the instances of a GPU-deferred glyph field and the base glyph mesh.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
        glyphs: &GpuGlyphs,
        glyph_mesh: &TriangleMesh,
    ) -> Self {
        let (positions, normals) = expand_mesh(glyph_mesh);
        let num_vertices = positions.len() as u32;
        let num_instances = glyphs.len() as u32;

        // storage bindings must not be empty
        let placeholder = [<GlyphInstance as bytemuck::Zeroable>::zeroed()];
        let instances = if glyphs.instances.is_empty() {
            &placeholder[..]
        } else {
            &glyphs.instances[..]
        };

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glyph instances"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glyph uniforms"),
            contents: bytemuck::cast_slice(&[glyphs.uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let glyph_position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glyph positions"),
            contents: bytemuck::cast_slice(&non_empty(positions)),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let glyph_normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glyph normals"),
            contents: bytemuck::cast_slice(&non_empty(normals)),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph bind group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: instance_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: glyph_position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: glyph_normal_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            instance_buffer,
            uniform_buffer,
            glyph_position_buffer,
            glyph_normal_buffer,
            bind_group,
            num_vertices,
            num_instances,
        }
    }

    /// Like [`GlyphRenderData::new`], building the mesh of a built-in glyph.
    pub fn from_geometry(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
        glyphs: &GpuGlyphs,
        geometry: &GlyphGeometry,
    ) -> RenderResult<Self> {
        let mesh = geometry.mesh().ok_or(RenderError::MissingGlyphMesh)?;
        Ok(Self::new(device, bind_group_layout, camera_buffer, glyphs, &mesh))
    }

    /// Updates glyph uniforms, e.g. after the length range changed.
    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &GlyphUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Records the instanced draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline) {
        if self.num_instances == 0 || self.num_vertices == 0 {
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..self.num_vertices, 0..self.num_instances);
    }
}

fn non_empty(mut data: Vec<[f32; 4]>) -> Vec<[f32; 4]> {
    if data.is_empty() {
        data.push([0.0; 4]);
    }
    data
}
