//! Global uniform bindings for camera and scene lighting
//!
//! Manages the per-frame uniform buffer shared by every draw: camera matrices
//! plus one ambient and one shadow casting directional light.

use cgmath::Matrix4;

use crate::{
    gfx::camera::camera_utils::{convert_matrix4_to_array, CameraUniform},
    wgpu_utils::uniform_buffer::UniformBuffer,
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in `viewer.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    light_position: [f32; 4],
    light_color: [f32; 3],
    light_intensity: f32,
    ambient_color: [f32; 3],
    ambient_intensity: f32,
    light_view_proj: [[f32; 4]; 4],
}

/// Scene lighting: a directional light shining from `position` toward the
/// origin, plus uniform ambient light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [5.0, 5.0, 5.0],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 1.5,
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data.
/// `light_view_proj` maps world space into the shadow map.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
    light_view_proj: Matrix4<f32>,
) {
    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        light_position: [light.position[0], light.position[1], light.position[2], 0.0],
        light_color: light.color,
        light_intensity: light.intensity,
        ambient_color: light.ambient_color,
        ambient_intensity: light.ambient_intensity,
        light_view_proj: convert_matrix4_to_array(light_view_proj),
    };

    ubo.update_content(queue, content);
}

/// Bind group layout and bind group for the global uniforms, bound to slot 0
/// in every pipeline.
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
