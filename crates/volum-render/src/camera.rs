//! Camera uniforms shared by the glyph and isosurface shaders.

use glam::{Mat4, Vec3};

/// Camera data uploaded to binding 0 of every pipeline.
/// Layout must match the WGSL `Camera` struct (80 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// World-space eye position; w is unused.
    pub camera_pos: [f32; 4],
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0, 0.0, 5.0, 1.0],
        }
    }
}

impl CameraUniforms {
    /// Uniforms for a perspective camera at `eye` looking at `target`, y up.
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_radians: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(fov_y_radians, aspect, 0.01, 1000.0);
        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            camera_pos: eye.extend(1.0).to_array(),
        }
    }
}
