//! Camera trait and the uniform block shared with the shaders

use cgmath::{Matrix4, SquareMatrix, Vector3};

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
    fn eye_position(&self) -> Vector3<f32>;

    /// Uniform block for the camera's current state.
    fn to_uniform(&self) -> CameraUniform {
        CameraUniform::new(self.eye_position(), self.build_view_projection_matrix())
    }
}

/// Camera half of the global uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// Eye position, w = 1 to keep the 16 byte alignment.
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(eye: Vector3<f32>, view_proj: Matrix4<f32>) -> Self {
        Self {
            view_position: eye.extend(1.0).into(),
            view_proj: convert_matrix4_to_array(view_proj),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 0.0), Matrix4::identity())
    }
}

/// Column-major copy of `matrix` suitable for a WGSL `mat4x4<f32>`.
pub fn convert_matrix4_to_array(matrix: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix.into()
}
