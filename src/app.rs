//! Windowed application shell
//!
//! Wires one [`ModelViewer`] to a winit window: window events become
//! [`InputEvent`]s for the viewer, every redraw is one tick, and clicked
//! meshes open popups whose story requests run on the [`StoryWorker`].

use anyhow::Context;
use log::{error, info, warn};
use std::{cell::RefCell, rc::Rc, sync::Arc};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::SiteManifest,
    gfx::{picking::SurfaceRect, scene::AssetCache, RenderEngine},
    input::{InputEvent, InputEvents, ScrollTracker, WinitTranslator},
    story::{StoryClient, StoryWorker},
    ui::{Panels, PanelRoutes, PopupOrchestrator, UiManager},
    viewer::ModelViewer,
};

pub struct VitrineApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    manifest: SiteManifest,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    input: InputEvents,
    translator: WinitTranslator,
    scroll: ScrollTracker,
    viewer: ModelViewer,
    clicks: Rc<RefCell<Vec<String>>>,
    routes: PanelRoutes,
    popups: PopupOrchestrator,
    panels: Panels,
    worker: StoryWorker,
    fatal: Option<anyhow::Error>,
}

impl VitrineApp {
    /// Builds the viewer for `manifest` and loads its asset.
    ///
    /// A missing or broken asset is not an error here: the viewer stays in
    /// the failed state and the UI explains why.
    pub fn new(manifest: SiteManifest) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;

        let window = manifest.window;
        let mut viewer = ModelViewer::new(
            manifest.viewer_config(),
            (window.width as f32, window.height as f32),
        );
        let mut assets = AssetCache::default();
        viewer.load(&mut assets);

        let input = InputEvents::new();
        viewer.attach(&input);

        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        viewer.set_on_object_click(move |name| sink.borrow_mut().push(name.to_string()));

        let client = StoryClient::new(&manifest.api_base_url);
        info!("story API at {}", client.base_url());

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                routes: PanelRoutes::new(manifest.routes.clone()),
                popups: PopupOrchestrator::new(&manifest.info_panels),
                panels: Panels::new(manifest.info_panels.clone()),
                worker: StoryWorker::new(Arc::new(client)),
                manifest,
                window: None,
                render_engine: None,
                ui_manager: None,
                input,
                translator: WinitTranslator::new(),
                scroll: ScrollTracker::default(),
                viewer,
                clicks,
                fatal: None,
            },
        })
    }

    /// Runs the event loop until the window closes.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("Event loop failed")?;

        match self.app_state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let spec = self.manifest.window;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.manifest.title.clone())
                    .with_inner_size(LogicalSize::new(spec.width, spec.height))
                    .with_transparent(true),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let PhysicalSize { width, height } = window.inner_size();
        let renderer = pollster::block_on(RenderEngine::new(window.clone(), width, height))?;

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.viewer.resize(width as f32, height as f32);
        info!("window ready at {}x{}", width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    /// Forwards translated input to the viewer. Clicks are dropped while a
    /// popup covers the scene, and the wheel drives the scroll value.
    fn forward_input(&mut self, event: &WindowEvent) {
        for input in self.translator.translate(event) {
            match input {
                InputEvent::Click { .. } if self.popups.is_open() => {}
                InputEvent::Wheel { delta } => {
                    if !self.popups.is_open() {
                        self.scroll.apply_wheel(delta);
                        self.viewer.set_scroll_value(self.scroll.value());
                    }
                }
                other => {
                    self.input.dispatch(&other);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        for reply in self.worker.poll() {
            self.panels.apply(reply);
        }

        let clicked: Vec<String> = self.clicks.borrow_mut().drain(..).collect();
        for name in clicked {
            self.popups.open_for_mesh(&self.routes, &name);
        }

        let applied = self.viewer.tick();
        log::trace!("tick applied {} controls", applied);

        let (Some(render_engine), Some(ui_manager), Some(window)) = (
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
            self.window.as_ref(),
        ) else {
            return;
        };

        render_engine.update(self.viewer.camera_uniform());
        let items = self.viewer.draw_items();
        let load_state = self.viewer.load_state();

        let panels = &mut self.panels;
        let popups = &mut self.popups;
        let mut requests = Vec::new();
        let result = render_engine.render_frame(
            &items,
            Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    ui_manager.draw(device, queue, encoder, window, view, |ui| {
                        requests = panels.build(ui, popups, &load_state);
                    });
                },
            ),
        );

        for request in requests {
            self.worker.submit(request);
        }
        render_engine.release_unused_meshes();

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => warn!("frame skipped: {:?}", e),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            error!("startup failed: {:#}", e);
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_input(&window, window_id, &event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if self.popups.is_open() {
                    self.popups.close();
                } else {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.forward_input(&event);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                    let (surface_width, surface_height) = render_engine.surface_size();
                    self.viewer.set_surface_rect(SurfaceRect::new(
                        0.0,
                        0.0,
                        surface_width as f32,
                        surface_height as f32,
                    ));
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => self.forward_input(&event),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
