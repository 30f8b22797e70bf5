use super::camera_utils::{Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

const MIN_FOVY_DEG: f32 = 1.0;
const MAX_FOVY_DEG: f32 = 179.0;

/// Fixed-position perspective camera looking at a target point.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for PerspectiveCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection_matrix() * self.view_matrix()
    }

    fn eye_position(&self) -> Vector3<f32> {
        self.eye
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PerspectiveCamera {
    /// Camera at (0, 0, 500) looking at the origin with a 45° vertical field of view.
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            eye: Vector3::new(0.0, 0.0, 500.0),
            target: Vector3::zero(),
            up: Vector3::unit_y(),
            aspect: if aspect > 0.0 { aspect } else { 1.0 },
            fovy: Deg(45.0).into(),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
        };
        camera.update_view_proj();
        camera
    }

    pub fn with_fovy<A: Into<Rad<f32>>>(mut self, fovy: A) -> Self {
        self.set_fovy(fovy);
        self
    }

    pub fn set_fovy<A: Into<Rad<f32>>>(&mut self, fovy: A) {
        let fovy: Rad<f32> = fovy.into();
        let deg = Deg::from(fovy).0.clamp(MIN_FOVY_DEG, MAX_FOVY_DEG);
        self.fovy = Deg(deg).into();
        self.update_view_proj();
    }

    pub fn look_at(&mut self, eye: Vector3<f32>, target: Vector3<f32>) {
        self.eye = eye;
        self.target = target;
        self.update_view_proj();
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    /// OpenGL-convention projection (clip z in [-1, 1]).
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_view_proj();
    }

    pub fn update_view_proj(&mut self) {
        self.uniform = self.to_uniform();
    }
}
