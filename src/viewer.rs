//! Model viewer instance
//!
//! A [`ModelViewer`] owns one interactive scene: it samples input from the
//! window's listener registry, steers the model root through its transform
//! controls every tick, recolors meshes from its paint table, frames the camera
//! once per asset and turns clicks into mesh names.
//!
//! Viewers never share state. Each instance keeps its own sampler, controls and
//! clickable snapshot behind an `Rc<RefCell<_>>` that only its own listeners
//! can reach.

use std::{
    cell::RefCell,
    path::PathBuf,
    rc::{Rc, Weak},
    sync::Arc,
};

use cgmath::{Matrix4, Vector3};
use log::{debug, error, info};

use crate::{
    config::ViewerConfig,
    controls::{Integrator, TransformControl},
    gfx::{
        camera::{
            auto_frame::{frame_sphere, BoundingSphere},
            camera_utils::CameraUniform,
            PerspectiveCamera,
        },
        picking::{ClickFilter, HitTestDispatcher, PickResult, SurfaceRect},
        rendering::draw::{sort_for_blending, DrawItem},
        scene::{
            apply_paint_rules, graph::NodeVisitor, AssetCache, LoadState, MeshNode, PaintReport,
            PaintRule, SceneAsset, SceneGraph, Transform,
        },
    },
    input::{EventKind, InputEvent, InputEvents, InputSampler, ListenerGuard, SampledInput},
};

/// Called with the name of the clicked mesh.
pub type ClickCallback = Box<dyn FnMut(&str)>;

/// Holds the click callback. While it runs the callback sits outside the
/// slot, so `replaced` records a set or clear made from inside it.
#[derive(Default)]
struct ClickSlot {
    callback: Option<ClickCallback>,
    dispatching: bool,
    replaced: bool,
}

impl ClickSlot {
    fn set(&mut self, callback: Option<ClickCallback>) {
        self.callback = callback;
        self.replaced = self.dispatching;
    }
}

/// The installed asset as seen by one viewer.
///
/// Geometry is shared with the asset; materials are shared until the recolor
/// pass derives per-node copies.
pub struct InteractiveScene {
    asset: Arc<SceneAsset>,
    graph: SceneGraph,
    hit_test: HitTestDispatcher,
    bounds: BoundingSphere,
    paint_report: PaintReport,
}

impl InteractiveScene {
    fn install(
        asset: Arc<SceneAsset>,
        rules: &[PaintRule],
        filter: &ClickFilter,
        camera: &mut PerspectiveCamera,
    ) -> Self {
        let mut graph = asset.graph.clone();
        let paint_report = apply_paint_rules(&mut graph, rules);

        let mut hit_test = HitTestDispatcher::new(filter.clone());
        hit_test.rebuild(&graph);

        let bounds = graph
            .world_bounds()
            .map(|aabb| BoundingSphere::from_box(&aabb))
            .unwrap_or_else(BoundingSphere::empty);
        frame_sphere(camera, &bounds, Vector3::unit_z());

        Self {
            asset,
            graph,
            hit_test,
            bounds,
            paint_report,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn bounds(&self) -> BoundingSphere {
        self.bounds
    }

    pub fn root(&self) -> &Transform {
        self.graph.root_transform()
    }

    pub fn paint_report(&self) -> PaintReport {
        self.paint_report
    }
}

struct ViewerState {
    asset_path: PathBuf,
    sampler: InputSampler,
    integrator: Integrator,
    controls: Vec<TransformControl>,
    paint_rules: Vec<PaintRule>,
    filter: ClickFilter,
    camera: PerspectiveCamera,
    surface: SurfaceRect,
    scene: Option<InteractiveScene>,
    load_state: LoadState,
}

impl ViewerState {
    fn resize(&mut self, width: f32, height: f32) {
        self.sampler.set_viewport(width, height);
        self.camera
            .resize_projection(width.max(0.0) as u32, height.max(0.0) as u32);
        self.surface = SurfaceRect::new(0.0, 0.0, width, height);
    }

    fn pick(&self, x: f32, y: f32) -> Option<PickResult> {
        let scene = self.scene.as_ref()?;
        scene
            .hit_test
            .pick_at((x, y), &self.surface, &self.camera, &scene.graph.root_matrix())
    }
}

/// Collects every mesh node as a draw with its resolved color.
struct CollectDraws {
    root: Matrix4<f32>,
    items: Vec<DrawItem>,
}

impl NodeVisitor for CollectDraws {
    fn visit_mesh(&mut self, node: &MeshNode, local_to_root: &Matrix4<f32>) {
        if node.mesh.is_empty() {
            return;
        }
        self.items.push(DrawItem {
            mesh: Arc::clone(&node.mesh),
            model: self.root * local_to_root,
            base_color: node.material.base_color,
            transparent: node.material.transparent,
            cast_shadow: node.cast_shadow,
        });
    }
}

/// One 3D viewer bound to a window's input.
pub struct ModelViewer {
    state: Rc<RefCell<ViewerState>>,
    on_click: Rc<RefCell<ClickSlot>>,
    guards: Vec<ListenerGuard>,
}

impl ModelViewer {
    /// Creates a detached viewer for a surface of `viewport` pixels.
    pub fn new(config: ViewerConfig, viewport: (f32, f32)) -> Self {
        let (width, height) = viewport;
        let mut sampler = InputSampler::new(width, height);
        sampler.set_scroll(config.scroll_value);

        let aspect = if height > 0.0 { width / height } else { 1.0 };

        let state = ViewerState {
            asset_path: config.obj_to_display,
            sampler,
            integrator: Integrator::default(),
            controls: config.transform_controls,
            paint_rules: config.objects_to_paint,
            filter: ClickFilter::from(config.clickable_objects),
            camera: PerspectiveCamera::new(aspect),
            surface: SurfaceRect::new(0.0, 0.0, width, height),
            scene: None,
            load_state: LoadState::Pending,
        };

        Self {
            state: Rc::new(RefCell::new(state)),
            on_click: Rc::new(RefCell::new(ClickSlot::default())),
            guards: Vec::new(),
        }
    }

    /// Registers this viewer's pointer, touch, click and resize listeners.
    /// Attaching again first releases the previous registration.
    pub fn attach(&mut self, events: &InputEvents) {
        self.detach();

        let sampled = |state: Weak<RefCell<ViewerState>>| {
            move |event: &InputEvent| {
                if let Some(state) = state.upgrade() {
                    state.borrow_mut().sampler.handle(event);
                }
            }
        };
        self.guards
            .push(events.listen(EventKind::Pointer, sampled(Rc::downgrade(&self.state))));
        self.guards
            .push(events.listen(EventKind::Touch, sampled(Rc::downgrade(&self.state))));

        let state = Rc::downgrade(&self.state);
        self.guards.push(events.listen(EventKind::Resize, move |event| {
            if let (Some(state), InputEvent::ViewportResized { width, height }) =
                (state.upgrade(), event)
            {
                state.borrow_mut().resize(*width, *height);
            }
        }));

        let state = Rc::downgrade(&self.state);
        let on_click = Rc::downgrade(&self.on_click);
        self.guards.push(events.listen(EventKind::Click, move |event| {
            if let (Some(state), Some(on_click), InputEvent::Click { x, y }) =
                (state.upgrade(), on_click.upgrade(), event)
            {
                dispatch_click(&state, &on_click, *x, *y);
            }
        }));

        debug!("viewer attached with {} listeners", self.guards.len());
    }

    /// Releases every listener. Safe to call repeatedly.
    pub fn detach(&mut self) {
        for guard in &mut self.guards {
            guard.release();
        }
        self.guards.clear();
    }

    pub fn is_attached(&self) -> bool {
        !self.guards.is_empty() && self.guards.iter().all(ListenerGuard::is_active)
    }

    pub fn set_on_object_click<F>(&self, callback: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.on_click.borrow_mut().set(Some(Box::new(callback)));
    }

    /// Removes the click callback. Calling this from inside the callback
    /// keeps it from being reinstalled afterwards.
    pub fn clear_on_object_click(&self) {
        self.on_click.borrow_mut().set(None);
    }

    pub fn asset_path(&self) -> PathBuf {
        self.state.borrow().asset_path.clone()
    }

    /// Loads the configured asset through `cache` and installs it.
    pub fn load(&self, cache: &mut AssetCache) -> LoadState {
        let path = self.asset_path();
        match cache.get_or_load(&path) {
            Ok(asset) => self.set_asset(asset),
            Err(e) => self.set_load_failed(&e.to_string()),
        }
        self.load_state()
    }

    /// Installs `asset`, replacing any current scene.
    ///
    /// The old scene and its clickable snapshot are dropped first. The paint
    /// table is applied and the camera framed before this returns. Installing
    /// the asset that is already shown does nothing.
    pub fn set_asset(&self, asset: Arc<SceneAsset>) {
        let mut state = self.state.borrow_mut();
        if state
            .scene
            .as_ref()
            .is_some_and(|scene| Arc::ptr_eq(&scene.asset, &asset))
        {
            return;
        }

        state.scene = None;
        let ViewerState {
            paint_rules,
            filter,
            camera,
            ..
        } = &mut *state;
        let scene = InteractiveScene::install(asset, paint_rules, filter, camera);
        info!(
            "installed {} ({} painted, {} clickable)",
            scene.asset.path.display(),
            scene.paint_report.painted,
            scene.hit_test.targets().len()
        );
        state.scene = Some(scene);
        state.load_state = LoadState::Ready;
    }

    /// Drops the current scene and records why loading failed.
    pub fn set_load_failed(&self, message: &str) {
        error!("asset load failed: {}", message);
        let mut state = self.state.borrow_mut();
        state.scene = None;
        state.load_state = LoadState::Failed(message.to_string());
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load_state.clone()
    }

    /// Replaces the paint table and reapplies it to the current scene.
    pub fn set_paint_rules(&self, rules: Vec<PaintRule>) {
        let mut state = self.state.borrow_mut();
        let ViewerState {
            paint_rules, scene, ..
        } = &mut *state;
        *paint_rules = rules;
        if let Some(scene) = scene {
            scene.paint_report = apply_paint_rules(&mut scene.graph, paint_rules);
            debug!("paint table reapplied: {:?}", scene.paint_report);
        }
    }

    pub fn set_transform_controls(&self, controls: Vec<TransformControl>) {
        self.state.borrow_mut().controls = controls;
    }

    /// Restricts which meshes clicks may report and rebuilds the snapshot.
    pub fn set_clickable_objects(&self, names: Option<Vec<String>>) {
        let mut state = self.state.borrow_mut();
        let filter = ClickFilter::from(names);
        if let Some(scene) = state.scene.as_mut() {
            scene.hit_test.set_filter(filter.clone());
            scene.hit_test.rebuild(&scene.graph);
        }
        state.filter = filter;
    }

    pub fn set_scroll_value(&self, scroll: Option<f32>) {
        self.state.borrow_mut().sampler.set_scroll(scroll);
    }

    /// Sets the rectangle, in window pixels, the scene is drawn into.
    pub fn set_surface_rect(&self, rect: SurfaceRect) {
        self.state.borrow_mut().surface = rect;
    }

    /// Applies a new surface size directly, for hosts that do not route
    /// resize events through [`InputEvents`].
    pub fn resize(&self, width: f32, height: f32) {
        self.state.borrow_mut().resize(width, height);
    }

    /// Advances every transform control one smoothing step.
    ///
    /// Returns how many controls were applied; zero before a scene is installed.
    pub fn tick(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let ViewerState {
            sampler,
            integrator,
            controls,
            scene,
            ..
        } = &mut *state;
        match scene {
            Some(scene) => {
                integrator.step(controls, &sampler.sample(), scene.graph.root_transform_mut())
            }
            None => 0,
        }
    }

    /// Resolves a click at window position `(x, y)` and fires the click
    /// callback on a hit. Returns the mesh name that was hit.
    pub fn handle_click(&self, x: f32, y: f32) -> Option<String> {
        dispatch_click(&self.state, &self.on_click, x, y)
    }

    /// Meshes to draw this frame, opaque first and blended back to front.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let state = self.state.borrow();
        let Some(scene) = state.scene.as_ref() else {
            return Vec::new();
        };
        let mut collector = CollectDraws {
            root: scene.graph.root_matrix(),
            items: Vec::new(),
        };
        scene.graph.visit(&mut collector);
        sort_for_blending(&mut collector.items, state.camera.eye);
        collector.items
    }

    pub fn camera(&self) -> PerspectiveCamera {
        self.state.borrow().camera
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.state.borrow().camera.uniform
    }

    pub fn sample(&self) -> SampledInput {
        self.state.borrow().sampler.sample()
    }

    /// Current controlled root transform, if a scene is installed.
    pub fn root_transform(&self) -> Option<Transform> {
        self.state.borrow().scene.as_ref().map(|s| *s.root())
    }

    pub fn bounds(&self) -> Option<BoundingSphere> {
        self.state.borrow().scene.as_ref().map(|s| s.bounds)
    }

    pub fn clickable_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .scene
            .as_ref()
            .map(|s| s.hit_test.targets().iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn mesh_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .scene
            .as_ref()
            .map(|s| s.graph.mesh_names())
            .unwrap_or_default()
    }

    /// Resolved RGBA of a mesh in the current scene.
    pub fn mesh_color(&self, name: &str) -> Option<[f32; 4]> {
        let state = self.state.borrow();
        let mesh = state.scene.as_ref()?.graph.find_mesh(name)?;
        Some(mesh.material.base_color)
    }
}

impl Drop for ModelViewer {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Hit-tests with the state borrowed, then runs the callback with every
/// borrow released so it may call back into the viewer.
fn dispatch_click(
    state: &RefCell<ViewerState>,
    on_click: &RefCell<ClickSlot>,
    x: f32,
    y: f32,
) -> Option<String> {
    let hit = state.borrow().pick(x, y)?;
    debug!("click at ({x:.1}, {y:.1}) hit '{}' at {:.3}", hit.name, hit.distance);

    let callback = {
        let mut slot = on_click.borrow_mut();
        slot.dispatching = true;
        slot.replaced = false;
        slot.callback.take()
    };
    if let Some(mut callback) = callback {
        callback(&hit.name);
        let mut slot = on_click.borrow_mut();
        if !slot.replaced {
            slot.callback = Some(callback);
        }
    }
    let mut slot = on_click.borrow_mut();
    slot.dispatching = false;
    slot.replaced = false;
    Some(hit.name)
}
