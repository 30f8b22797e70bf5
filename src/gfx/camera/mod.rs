pub mod auto_frame;
pub mod camera_utils;
pub mod perspective_camera;

pub use auto_frame::{frame_sphere, BoundingSphere, MIN_FRAME_RADIUS};
pub use camera_utils::{Camera, CameraUniform};
pub use perspective_camera::PerspectiveCamera;
