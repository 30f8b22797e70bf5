//! Drives viewers end to end through the input registry, without a GPU.

use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc};

use vitrine::{
    config::{SiteManifest, ViewerConfig},
    controls::{InputAxis, InputSource, TransformControl, TransformTarget, SMOOTHING_FACTOR},
    gfx::{
        resources::Material,
        scene::{mesh::Mesh, AssetCache, LoadState, MeshNode, SceneAsset, SceneGraph, SceneNode, Transform},
    },
    input::{InputEvent, InputEvents},
    ModelViewer,
};

const VIEWPORT: (f32, f32) = (800.0, 600.0);

fn cube(name: &str, position: (f32, f32, f32)) -> SceneNode {
    let mut node = MeshNode::new(
        name,
        Arc::new(Mesh::cuboid([0.5, 0.5, 0.5])),
        Arc::new(Material::default()),
    );
    node.transform = Transform::identity().with_position(position.0, position.1, position.2);
    SceneNode::Mesh(node)
}

fn asset(nodes: Vec<SceneNode>) -> Arc<SceneAsset> {
    Arc::new(SceneAsset {
        path: PathBuf::from("scene.obj"),
        graph: SceneGraph::group("scene", nodes),
    })
}

/// Steers `rotation.y` toward twice the pointer's x.
fn pointer_steering() -> TransformControl {
    TransformControl::new(
        "rotation.y".parse::<TransformTarget>().unwrap(),
        InputSource::Pointer,
        |input| input.component(InputAxis::X) * 2.0,
    )
}

fn recorder(viewer: &ModelViewer) -> Rc<RefCell<Vec<String>>> {
    let clicks = Rc::new(RefCell::new(Vec::new()));
    let sink = clicks.clone();
    viewer.set_on_object_click(move |name| sink.borrow_mut().push(name.to_string()));
    clicks
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn listeners_are_released_on_detach_and_drop() {
    let events = InputEvents::new();
    let mut viewer = ModelViewer::new(ViewerConfig::new("scene.obj"), VIEWPORT);

    viewer.attach(&events);
    assert!(viewer.is_attached());
    let registered = events.listener_count();
    assert!(registered > 0);

    viewer.attach(&events);
    assert_eq!(events.listener_count(), registered);

    viewer.detach();
    assert!(!viewer.is_attached());
    assert_eq!(events.listener_count(), 0);

    viewer.attach(&events);
    drop(viewer);
    assert_eq!(events.listener_count(), 0);
    assert_eq!(events.dispatch(&InputEvent::PointerMoved { x: 1.0, y: 1.0 }), 0);
}

#[test]
fn viewers_do_not_share_input() {
    let left_events = InputEvents::new();
    let right_events = InputEvents::new();

    let mut left = ModelViewer::new(
        ViewerConfig::new("scene.obj").with_transform_controls(vec![pointer_steering()]),
        VIEWPORT,
    );
    let mut right = ModelViewer::new(
        ViewerConfig::new("scene.obj").with_transform_controls(vec![pointer_steering()]),
        VIEWPORT,
    );
    left.attach(&left_events);
    right.attach(&right_events);
    left.set_asset(asset(vec![cube("a", (0.0, 0.0, 0.0))]));
    right.set_asset(asset(vec![cube("a", (0.0, 0.0, 0.0))]));

    left_events.dispatch(&InputEvent::PointerMoved { x: 800.0, y: 300.0 });
    assert!((left.sample().pointer.x - 1.0).abs() < 1e-6);
    assert_eq!(right.sample().pointer.x, 0.0);

    left.tick();
    right.tick();
    assert!((left.root_transform().unwrap().rotation.y - 0.2).abs() < 1e-5);
    assert_eq!(right.root_transform().unwrap().rotation.y, 0.0);
}

#[test]
fn pointer_steering_converges() {
    let events = InputEvents::new();
    let mut viewer = ModelViewer::new(
        ViewerConfig::new("scene.obj").with_transform_controls(vec![pointer_steering()]),
        VIEWPORT,
    );
    viewer.attach(&events);
    viewer.set_asset(asset(vec![cube("a", (0.0, 0.0, 0.0))]));
    events.dispatch(&InputEvent::PointerMoved { x: 800.0, y: 0.0 });

    let mut previous = 0.0;
    for n in 1..=40 {
        assert_eq!(viewer.tick(), 1);
        let current = viewer.root_transform().unwrap().rotation.y;
        let expected = 2.0 * (1.0 - (1.0 - SMOOTHING_FACTOR).powi(n));
        assert!((current - expected).abs() < 1e-4);
        assert!(current >= previous && current <= 2.0);
        previous = current;
    }
}

#[test]
fn click_reports_nearest_mesh() {
    let events = InputEvents::new();
    let mut viewer = ModelViewer::new(ViewerConfig::new("scene.obj"), VIEWPORT);
    viewer.attach(&events);
    let clicks = recorder(&viewer);

    viewer.set_asset(asset(vec![
        cube("back", (0.0, 0.0, -1.0)),
        cube("front", (0.0, 0.0, 1.0)),
    ]));

    events.dispatch(&InputEvent::Click { x: 420.0, y: 310.0 });
    assert_eq!(*clicks.borrow(), vec!["front".to_string()]);

    // Far corner of the window misses everything.
    events.dispatch(&InputEvent::Click { x: 2.0, y: 2.0 });
    assert_eq!(clicks.borrow().len(), 1);
}

#[test]
fn clickable_list_hides_other_meshes() {
    let events = InputEvents::new();
    let mut viewer = ModelViewer::new(
        ViewerConfig::new("scene.obj").with_clickable_objects(Some(vec!["back".to_string()])),
        VIEWPORT,
    );
    viewer.attach(&events);
    let clicks = recorder(&viewer);

    viewer.set_asset(asset(vec![
        cube("back", (0.0, 0.0, -1.0)),
        cube("front", (0.0, 0.0, 1.0)),
    ]));

    events.dispatch(&InputEvent::Click { x: 420.0, y: 310.0 });
    assert_eq!(*clicks.borrow(), vec!["back".to_string()]);
}

#[test]
fn scene_swap_discards_clickable_snapshot() {
    let events = InputEvents::new();
    let mut viewer = ModelViewer::new(ViewerConfig::new("scene.obj"), VIEWPORT);
    viewer.attach(&events);
    let clicks = recorder(&viewer);

    viewer.set_asset(asset(vec![cube("old", (0.0, 0.0, 0.0))]));
    viewer.set_asset(asset(vec![cube("new", (0.0, 0.0, 0.0))]));
    assert_eq!(viewer.clickable_names(), vec!["new".to_string()]);

    events.dispatch(&InputEvent::Click { x: 420.0, y: 310.0 });
    assert_eq!(*clicks.borrow(), vec!["new".to_string()]);
}

#[test]
fn clicks_before_load_are_ignored() {
    let events = InputEvents::new();
    let mut viewer = ModelViewer::new(ViewerConfig::new("scene.obj"), VIEWPORT);
    viewer.attach(&events);
    let clicks = recorder(&viewer);

    events.dispatch(&InputEvent::Click { x: 400.0, y: 300.0 });
    assert!(clicks.borrow().is_empty());
    assert_eq!(viewer.load_state(), LoadState::Pending);
}

#[test]
fn bookshelf_demo_loads_and_paints() {
    let manifest = SiteManifest::load(&demo("site.json")).unwrap();
    let viewer = ModelViewer::new(manifest.viewer_config(), VIEWPORT);
    let mut cache = AssetCache::default();

    assert_eq!(viewer.load(&mut cache), LoadState::Ready);
    let mut names = viewer.mesh_names();
    names.sort();
    assert_eq!(names, vec!["1", "3", "3001", "shelf"]);

    let book = viewer.mesh_color("1").unwrap();
    assert!((book[0] - 1.0).abs() < 1e-4);
    assert!((book[1] - 87.0 / 255.0).abs() < 1e-4);
    assert!((book[2] - 51.0 / 255.0).abs() < 1e-4);

    let shelf = viewer.mesh_color("shelf").unwrap();
    assert!((shelf[0] - 0.45).abs() < 1e-4);

    let bounds = viewer.bounds().unwrap();
    assert!(bounds.radius > 0.0);
    assert!(viewer.camera().eye.z > bounds.center.z);
}

#[test]
fn window_demo_blends_the_glass_last() {
    let manifest = SiteManifest::load(&demo("window.json")).unwrap();
    let viewer = ModelViewer::new(manifest.viewer_config(), VIEWPORT);
    let mut cache = AssetCache::default();

    assert_eq!(viewer.load(&mut cache), LoadState::Ready);
    assert_eq!(viewer.clickable_names(), vec!["Glass".to_string()]);

    let items = viewer.draw_items();
    assert_eq!(items.len(), 5);
    assert!(items[..4].iter().all(|item| !item.transparent));
    assert!(items[4].transparent);
}

#[test]
fn missing_asset_fails_softly() {
    let viewer = ModelViewer::new(ViewerConfig::new(demo("nope.obj")), VIEWPORT);
    let mut cache = AssetCache::default();

    assert!(matches!(viewer.load(&mut cache), LoadState::Failed(_)));
    assert_eq!(viewer.tick(), 0);
    assert!(viewer.draw_items().is_empty());
}
