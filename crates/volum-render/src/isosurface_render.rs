//! Isosurface GPU rendering resources.

use std::num::NonZeroU64;

use glam::{Mat4, Vec3};
use volum_core::IsoSurface;
use wgpu::util::DeviceExt;

use crate::camera::CameraUniforms;
use crate::glyph_render::expand_mesh;
use crate::shader::{isosurface_shader_source, ShaderBuilder};

/// Uniforms for isosurface rendering.
/// Layout must match the WGSL `IsosurfaceUniforms` struct (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct IsosurfaceUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl Default for IsosurfaceUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: [0.5, 0.5, 0.5, 1.0], // gray
        }
    }
}

impl IsosurfaceUniforms {
    /// Identity model transform with the given color.
    #[must_use]
    pub fn with_color(color: Vec3, alpha: f32) -> Self {
        Self {
            color: color.extend(alpha).to_array(),
            ..Self::default()
        }
    }
}

/// GPU resources for one isosurface.
pub struct IsosurfaceRenderData {
    /// Position buffer (storage, vec4 per expanded triangle vertex).
    pub vertex_buffer: wgpu::Buffer,
    /// Normal buffer (storage, vec4 per expanded triangle vertex).
    pub normal_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    /// Number of vertices (expanded triangle vertices, for non-indexed draw).
    pub num_vertices: u32,
}

/// Bind group layout for isosurfaces: camera, surface uniforms, positions, normals.
pub fn create_isosurface_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let uniform = |binding: u32, size: usize| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    };
    let storage = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("isosurface bind group layout"),
        entries: &[
            uniform(0, std::mem::size_of::<CameraUniforms>()),
            uniform(1, std::mem::size_of::<IsosurfaceUniforms>()),
            storage(2),
            storage(3),
        ],
    })
}

/// Render pipeline for isosurfaces. Both faces are drawn.
pub fn create_isosurface_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
) -> crate::RenderResult<wgpu::RenderPipeline> {
    let shader = ShaderBuilder::new()
        .with_source(isosurface_shader_source())
        .with_label("isosurface shader")
        .build_module(device)?;

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("isosurface pipeline layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("isosurface pipeline"),
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
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
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

impl IsosurfaceRenderData {
    /// Creates render data from an extracted, world-space isosurface.
    ///
    /// Vertices/normals are expanded per-triangle (non-indexed drawing with storage buffers).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
        surface: &IsoSurface,
        uniforms: IsosurfaceUniforms,
    ) -> Self {
        let (mut positions, mut normals) = expand_mesh(&surface.mesh);
        let num_vertices = positions.len() as u32;
        if positions.is_empty() {
            log::debug!("isosurface at level {} is empty", surface.level);
            positions.push([0.0; 4]);
            normals.push([0.0; 4]);
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("isosurface vertices"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("isosurface normals"),
            contents: bytemuck::cast_slice(&normals),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("isosurface uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("isosurface bind group"),
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
                    resource: vertex_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: normal_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            vertex_buffer,
            normal_buffer,
            uniform_buffer,
            bind_group,
            num_vertices,
        }
    }

    /// Updates the uniform buffer.
    pub fn update_uniforms(&self, queue: &wgpu::Queue, uniforms: &IsosurfaceUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Records the draw; empty surfaces draw nothing.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline) {
        if self.num_vertices == 0 {
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..self.num_vertices, 0..1);
    }
}
