//! Named render pipelines built from shader modules
//!
//! Shaders are loaded once and pipelines are registered by name, then built
//! together. The renderer only ever looks pipelines up by name.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline '{pipeline}' uses shader '{shader}', which is not loaded")]
    MissingShader { pipeline: String, shader: String },
}

/// How fragments of one pipeline land in the colour and depth targets.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub vertex_entry: &'static str,
    /// `None` for depth-only pipelines.
    pub fragment_entry: Option<&'static str>,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub color_format: TextureFormat,
    pub blend: BlendState,
    pub cull_mode: Option<Face>,
    /// Depth buffer format and whether fragments write to it.
    pub depth: Option<(TextureFormat, bool)>,
}

impl PipelineConfig {
    /// Opaque, back-face culled triangles drawn with the `shader` module.
    pub fn opaque(label: &str, shader: &str, color_format: TextureFormat) -> Self {
        Self {
            label: label.to_string(),
            shader: shader.to_string(),
            vertex_entry: "vs_main",
            fragment_entry: Some("fs_main"),
            bind_group_layouts: Vec::new(),
            color_format,
            blend: BlendState::REPLACE,
            cull_mode: Some(Face::Back),
            depth: None,
        }
    }

    /// Alpha blended, double sided, depth tested but not depth written.
    pub fn blended(mut self) -> Self {
        self.blend = BlendState::ALPHA_BLENDING;
        self.cull_mode = None;
        if let Some((_, write)) = self.depth.as_mut() {
            *write = false;
        }
        self
    }

    /// Depth writes only, both faces, through `vertex_entry`.
    pub fn depth_only(label: &str, shader: &str, vertex_entry: &'static str) -> Self {
        let mut config = Self::opaque(label, shader, TextureFormat::Depth32Float);
        config.vertex_entry = vertex_entry;
        config.fragment_entry = None;
        config.cull_mode = None;
        config
    }

    pub fn with_fragment_entry(mut self, entry: &'static str) -> Self {
        self.fragment_entry = Some(entry);
        self
    }

    pub fn with_depth(mut self, format: TextureFormat) -> Self {
        let write = self.blend == BlendState::REPLACE;
        self.depth = Some((format, write));
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }
}

pub struct PipelineManager {
    device: Arc<Device>,
    shaders: HashMap<String, ShaderModule>,
    configs: Vec<(String, PipelineConfig)>,
    pipelines: HashMap<String, RenderPipeline>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            shaders: HashMap::new(),
            configs: Vec::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles a WGSL module under `name`.
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shaders.insert(name.to_string(), module);
    }

    /// Registers `config` under `name`; nothing is built until
    /// [`build_all`](Self::build_all).
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.configs.push((name.to_string(), config));
    }

    /// Builds every registered pipeline not built yet. Pipelines that fail
    /// stay registered and are reported.
    pub fn build_all(&mut self) -> Result<(), Vec<PipelineError>> {
        let mut errors = Vec::new();
        for (name, config) in &self.configs {
            if self.pipelines.contains_key(name) {
                continue;
            }
            match self.build(name, config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.clone(), pipeline);
                }
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            total_pipelines: self.pipelines.len(),
            pending_pipelines: self.configs.len().saturating_sub(self.pipelines.len()),
            loaded_shaders: self.shaders.len(),
        }
    }

    fn build(&self, name: &str, config: &PipelineConfig) -> Result<RenderPipeline, PipelineError> {
        let shader = self
            .shaders
            .get(&config.shader)
            .ok_or_else(|| PipelineError::MissingShader {
                pipeline: name.to_string(),
                shader: config.shader.clone(),
            })?;

        let layouts: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", config.label)),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let targets = [Some(ColorTargetState {
            format: config.color_format,
            blend: Some(config.blend),
            write_mask: ColorWrites::ALL,
        })];

        Ok(self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some(config.vertex_entry),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: config.fragment_entry.map(|entry| FragmentState {
                    module: shader,
                    entry_point: Some(entry),
                    targets: &targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    cull_mode: config.cull_mode,
                    ..Default::default()
                },
                depth_stencil: config.depth.map(|(format, write)| DepthStencilState {
                    format,
                    depth_write_enabled: write,
                    depth_compare: CompareFunction::Less,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub total_pipelines: usize,
    pub pending_pipelines: usize,
    pub loaded_shaders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blended_config_stops_depth_writes() {
        let opaque = PipelineConfig::opaque("Opaque", "viewer", TextureFormat::Bgra8Unorm)
            .with_depth(TextureFormat::Depth32Float);
        assert_eq!(opaque.depth, Some((TextureFormat::Depth32Float, true)));
        assert_eq!(opaque.cull_mode, Some(Face::Back));

        let blended = opaque.blended();
        assert_eq!(blended.depth, Some((TextureFormat::Depth32Float, false)));
        assert_eq!(blended.blend, BlendState::ALPHA_BLENDING);
        assert!(blended.cull_mode.is_none());
    }

    #[test]
    fn test_depth_added_after_blending_is_read_only() {
        let config = PipelineConfig::opaque("Blended", "viewer", TextureFormat::Bgra8Unorm)
            .blended()
            .with_depth(TextureFormat::Depth32Float);
        assert_eq!(config.depth, Some((TextureFormat::Depth32Float, false)));
    }

    #[test]
    fn test_depth_only_config_skips_fragment_stage() {
        let config = PipelineConfig::depth_only("Shadow Casters", "viewer", "vs_shadow")
            .with_depth(TextureFormat::Depth32Float);
        assert_eq!(config.vertex_entry, "vs_shadow");
        assert!(config.fragment_entry.is_none());
        assert!(config.cull_mode.is_none());
        assert_eq!(config.depth, Some((TextureFormat::Depth32Float, true)));

        let catcher = PipelineConfig::opaque("Catcher", "viewer", TextureFormat::Bgra8Unorm)
            .blended()
            .with_fragment_entry("fs_shadow_catcher");
        assert_eq!(catcher.fragment_entry, Some("fs_shadow_catcher"));
    }
}
