// src/lib.rs
//! vitrine
//!
//! An interactive 3D showcase viewer built on wgpu and winit. A
//! [`ModelViewer`] steers a model from pointer, touch and scroll input,
//! recolors its meshes from a paint table, frames the camera around it and
//! reports clicked meshes; [`VitrineApp`] puts it in a window with story
//! popups on top.

pub mod app;
pub mod config;
pub mod controls;
pub mod gfx;
pub mod input;
pub mod story;
pub mod ui;
pub mod viewer;
pub mod wgpu_utils;

pub use app::VitrineApp;
pub use config::{SiteManifest, ViewerConfig};
pub use viewer::ModelViewer;
