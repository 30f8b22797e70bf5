// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, GPU mesh uploads, shadows and frame rendering.

pub mod draw;
pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow;

// Re-export main types
pub use draw::{sort_for_blending, DrawItem};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
pub use shadow::ShadowFrame;
