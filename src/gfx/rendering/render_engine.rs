//! WGPU-based rendering engine for the model viewer
//!
//! Owns the surface, device and queue, renders shadow casters from the light,
//! draws the scene's [`DrawItem`]s lit over a transparent background with a
//! shadow-only ground plane, and hands the encoder to an optional UI overlay.

use std::{borrow::Cow, sync::Arc};

use anyhow::Context;
use cgmath::{Matrix4, SquareMatrix};
use wgpu::TextureFormat;

use crate::gfx::{
    camera::camera_utils::CameraUniform,
    resources::{
        depth_buffer::DepthBuffer,
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig},
        shadow_map::ShadowMap,
    },
    scene::mesh::Mesh,
};

use super::draw::{object_bind_group_layout, DrawItem, MeshCache, ObjectSlot, ObjectUniform};
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shadow::{shadow_casters, ShadowFrame};

const OPAQUE_PIPELINE: &str = "Opaque";
const BLENDED_PIPELINE: &str = "Blended";
const SHADOW_PIPELINE: &str = "Shadow";
const CATCHER_PIPELINE: &str = "Shadow Catcher";

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_buffer: DepthBuffer,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_layout: wgpu::BindGroupLayout,
    object_slots: Vec<ObjectSlot>,
    mesh_cache: MeshCache,
    light_config: LightConfig,
    camera: CameraUniform,
    shadow_map: ShadowMap,
    ground: Arc<Mesh>,
}

impl RenderEngine {
    /// Acquires a device for `window` and builds the mesh pipelines.
    ///
    /// # Errors
    /// Fails when no adapter or device can be acquired for the surface.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no texture formats")?;

        // Prefer a compositor mode that lets the transparent clear show through.
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_capabilities.alpha_modes.contains(mode))
        .or_else(|| surface_capabilities.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?} alpha {:?}",
            config.width,
            config.height,
            format,
            alpha_mode
        );

        let depth_buffer = DepthBuffer::for_surface(&device, &config);

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let object_layout = object_bind_group_layout(&device);
        let shadow_map = ShadowMap::new(&device);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());
        pipeline_manager.load_shader("viewer", include_str!("viewer.wgsl"));

        let caster_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            object_layout.clone(),
        ];
        let mut layouts = caster_layouts.clone();
        layouts.push(shadow_map.bind_group_layout().clone());

        // Both faces go into the shadow map so open meshes still cast.
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::depth_only("Shadow Casters", "viewer", "vs_shadow")
                .with_depth(ShadowMap::FORMAT)
                .with_bind_group_layouts(caster_layouts),
        );
        let opaque = PipelineConfig::opaque("Opaque Meshes", "viewer", format)
            .with_depth(DepthBuffer::FORMAT)
            .with_bind_group_layouts(layouts);
        pipeline_manager.register_pipeline(
            CATCHER_PIPELINE,
            opaque
                .clone()
                .blended()
                .with_fragment_entry("fs_shadow_catcher"),
        );
        pipeline_manager.register_pipeline(BLENDED_PIPELINE, opaque.clone().blended());
        pipeline_manager.register_pipeline(OPAQUE_PIPELINE, opaque);

        if let Err(errors) = pipeline_manager.build_all() {
            for error in errors {
                log::error!("{}", error);
            }
        }
        log::debug!("Pipelines: {:?}", pipeline_manager.get_stats());

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_buffer,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            object_layout,
            object_slots: Vec::new(),
            mesh_cache: MeshCache::default(),
            light_config: LightConfig::default(),
            camera: CameraUniform::default(),
            shadow_map,
            ground: Arc::new(Mesh::ground_plane()),
        })
    }

    /// Renders shadow casters from the light, draws `items` and the ground
    /// plane over a transparent clear, then lets `ui_callback` record its
    /// overlay into the same encoder.
    ///
    /// `items` must already be ordered opaque first, blended back to front.
    pub fn render_frame<F>(
        &mut self,
        items: &[DrawItem],
        ui_callback: Option<F>,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let shadow = ShadowFrame::fit(items, &self.light_config, &self.ground);
        let light_view_proj = shadow
            .as_ref()
            .map_or_else(Matrix4::identity, |frame| frame.light_view_proj);
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            self.camera,
            self.light_config,
            light_view_proj,
        );
        let items: Cow<[DrawItem]> = match &shadow {
            Some(frame) => Cow::Owned(frame.with_receiver(items)),
            None => Cow::Borrowed(items),
        };

        while self.object_slots.len() < items.len() {
            self.object_slots
                .push(ObjectSlot::new(&self.device, &self.object_layout));
        }
        let mut prepared = Vec::with_capacity(items.len());
        for (slot, item) in self.object_slots.iter_mut().zip(items.iter()) {
            slot.update(&self.queue, ObjectUniform::new(item.model, item.base_color));
            let pipeline_name = if Arc::ptr_eq(&item.mesh, &self.ground) {
                CATCHER_PIPELINE
            } else if item.transparent {
                BLENDED_PIPELINE
            } else {
                OPAQUE_PIPELINE
            };
            prepared.push((self.mesh_cache.prepare(&self.device, &item.mesh), pipeline_name));
        }

        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(SHADOW_PIPELINE) {
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                for index in shadow_casters(&items) {
                    let (mesh_index, _) = prepared[index];
                    if let Some(gpu_mesh) = self.mesh_cache.get(mesh_index) {
                        shadow_pass.set_bind_group(1, self.object_slots[index].bind_group(), &[]);
                        gpu_mesh.draw(&mut shadow_pass);
                    }
                }
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_buffer.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
            render_pass.set_bind_group(2, self.shadow_map.bind_group(), &[]);

            let mut bound = None;
            for (&(mesh_index, pipeline_name), slot) in prepared.iter().zip(&self.object_slots) {
                if bound != Some(pipeline_name) {
                    let Some(pipeline) = self.pipeline_manager.pipeline(pipeline_name) else {
                        continue;
                    };
                    render_pass.set_pipeline(pipeline);
                    bound = Some(pipeline_name);
                }
                if let Some(gpu_mesh) = self.mesh_cache.get(mesh_index) {
                    render_pass.set_bind_group(1, slot.bind_group(), &[]);
                    gpu_mesh.draw(&mut render_pass);
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Sets the camera for the next frame. It is uploaded with the light's
    /// shadow projection in [`render_frame`](Self::render_frame).
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        self.camera = camera_uniform;
    }

    /// Releases GPU copies of meshes no longer referenced by any scene.
    pub fn release_unused_meshes(&mut self) {
        self.mesh_cache.prune();
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero-sized requests (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    /// Reconfigures the surface with its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_buffer = DepthBuffer::for_surface(&self.device, &self.config);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
