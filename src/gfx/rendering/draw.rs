//! Per-draw GPU state
//!
//! Scene meshes are uploaded once per distinct `Arc<Mesh>` and reused across
//! frames. Each draw gets a slot holding its model and normal matrices and its
//! resolved color.

use std::sync::Arc;

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    gfx::{camera::camera_utils::convert_matrix4_to_array, scene::mesh::Mesh},
    wgpu_utils::uniform_buffer::UniformBuffer,
};

/// One mesh instance ready to draw.
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub mesh: Arc<Mesh>,
    pub model: Matrix4<f32>,
    pub base_color: [f32; 4],
    pub transparent: bool,
    /// Drawn into the shadow map.
    pub cast_shadow: bool,
}

impl DrawItem {
    /// World-space center, used to order blended draws back to front.
    pub fn world_center(&self) -> cgmath::Vector3<f32> {
        self.mesh.bounds().transformed(&self.model).center()
    }
}

/// MUST match the `DrawData` struct in `viewer.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    base_color: [f32; 4],
}

impl ObjectUniform {
    /// The normal matrix is the inverse transpose of `model`, so normals stay
    /// perpendicular under non-uniform scale. Singular models fall back to
    /// `model` itself.
    pub fn new(model: Matrix4<f32>, base_color: [f32; 4]) -> Self {
        let normal_matrix = model.invert().map(|m| m.transpose()).unwrap_or(model);
        Self {
            model: convert_matrix4_to_array(model),
            normal_matrix: convert_matrix4_to_array(normal_matrix),
            base_color,
        }
    }
}

/// Vertex and index buffers of one uploaded mesh
pub struct GpuMesh {
    source: Arc<Mesh>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &Arc<Mesh>) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            source: mesh.clone(),
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices().len() as u32,
        }
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Uploaded meshes keyed by the identity of their `Arc`.
#[derive(Default)]
pub struct MeshCache {
    meshes: Vec<GpuMesh>,
}

impl MeshCache {
    /// Returns the index of the GPU copy of `mesh`, uploading it on first use.
    pub fn prepare(&mut self, device: &wgpu::Device, mesh: &Arc<Mesh>) -> usize {
        if let Some(index) = self
            .meshes
            .iter()
            .position(|gpu| Arc::ptr_eq(&gpu.source, mesh))
        {
            return index;
        }
        self.meshes.push(GpuMesh::upload(device, mesh));
        self.meshes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&GpuMesh> {
        self.meshes.get(index)
    }

    /// Drops GPU copies whose scene mesh is gone. Only call between frames.
    pub fn prune(&mut self) {
        let before = self.meshes.len();
        self.meshes.retain(|gpu| Arc::strong_count(&gpu.source) > 1);
        if self.meshes.len() != before {
            log::debug!("Released {} unused mesh uploads", before - self.meshes.len());
        }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// Reusable per-draw uniform buffers and their bind groups
pub struct ObjectSlot {
    ubo: UniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
}

impl ObjectSlot {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let ubo = UniformBuffer::new(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });
        Self { ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, content: ObjectUniform) {
        self.ubo.update_content(queue, content);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

pub fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Object Bind Group Layout"),
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
    })
}

/// Orders draws so opaque geometry comes first and blended geometry follows
/// from farthest to nearest.
pub fn sort_for_blending(items: &mut [DrawItem], eye: cgmath::Vector3<f32>) {
    use cgmath::InnerSpace;

    items.sort_by(|a, b| match (a.transparent, b.transparent) {
        (false, true) => std::cmp::Ordering::Less,
        (true, false) => std::cmp::Ordering::Greater,
        (false, false) => std::cmp::Ordering::Equal,
        (true, true) => {
            let da = (a.world_center() - eye).magnitude2();
            let db = (b.world_center() - eye).magnitude2();
            db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix4, SquareMatrix, Vector3};

    fn item(z: f32, transparent: bool) -> DrawItem {
        DrawItem {
            mesh: Arc::new(Mesh::cuboid([0.5, 0.5, 0.5])),
            model: Matrix4::from_translation(Vector3::new(0.0, 0.0, z)),
            base_color: [1.0, 1.0, 1.0, if transparent { 0.5 } else { 1.0 }],
            transparent,
            cast_shadow: !transparent,
        }
    }

    #[test]
    fn test_object_uniform_size() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 144);
        let uniform = ObjectUniform::new(Matrix4::identity(), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.normal_matrix, uniform.model);
    }

    #[test]
    fn test_normals_stay_perpendicular_under_stretch() {
        use cgmath::{InnerSpace, Vector4};

        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let uniform = ObjectUniform::new(model, [1.0; 4]);
        let normal_matrix = Matrix4::from(uniform.normal_matrix);

        // Surface x + y = c: normal (1, 1, 0), tangent (1, -1, 0).
        let tangent = model * Vector4::new(1.0, -1.0, 0.0, 0.0);
        let normal = normal_matrix * Vector4::new(1.0, 1.0, 0.0, 0.0);
        assert!(tangent.truncate().dot(normal.truncate()).abs() < 1e-6);

        let naive = model * Vector4::new(1.0, 1.0, 0.0, 0.0);
        assert!(tangent.truncate().dot(naive.truncate()).abs() > 1.0);
    }

    #[test]
    fn test_blended_draws_come_last_far_to_near() {
        let mut items = vec![item(4.0, true), item(0.0, false), item(-4.0, true)];
        sort_for_blending(&mut items, Vector3::new(0.0, 0.0, 10.0));

        assert!(!items[0].transparent);
        assert_eq!(items[1].model.w.z, -4.0);
        assert_eq!(items[2].model.w.z, 4.0);
    }
}
