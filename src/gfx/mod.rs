//! # Graphics Module
//!
//! Camera, picking, scene graph and GPU rendering for the model viewer.
//!
//! - **Camera** ([`camera`]) - Perspective camera and automatic framing
//! - **Picking** ([`picking`]) - Screen rays and mesh hit-testing
//! - **Scene** ([`scene`]) - Scene graph, mesh loading and material recoloring
//! - **Resources** ([`resources`]) - Materials, colors and GPU bindings
//! - **Rendering** ([`rendering`]) - wgpu pipelines and frame submission
//!
//! Everything except [`rendering`] and the GPU half of [`resources`] runs
//! without a device, so viewer logic can be tested headless.

pub mod camera;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::PerspectiveCamera;
pub use rendering::render_engine::RenderEngine;
