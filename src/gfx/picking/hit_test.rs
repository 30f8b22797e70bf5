//! Click-to-mesh dispatch
//!
//! Holds the snapshot of clickable meshes for the current scene and resolves a
//! click to the name of the nearest mesh under it.

use cgmath::Matrix4;
use log::debug;
use std::{collections::HashSet, sync::Arc};

use super::{screen_to_ray, transform_point, Ray, SurfaceRect};
use crate::gfx::{
    camera::PerspectiveCamera,
    scene::{graph::NodeVisitor, MeshNode, SceneGraph},
    scene::mesh::Mesh,
};

/// Which meshes may be reported by a click.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClickFilter {
    #[default]
    All,
    Only(HashSet<String>),
}

impl ClickFilter {
    pub fn allows(&self, name: &str) -> bool {
        match self {
            ClickFilter::All => true,
            ClickFilter::Only(names) => names.contains(name),
        }
    }
}

/// `None` and an empty list both mean "every mesh".
impl From<Option<Vec<String>>> for ClickFilter {
    fn from(names: Option<Vec<String>>) -> Self {
        match names {
            Some(names) if !names.is_empty() => ClickFilter::Only(names.into_iter().collect()),
            _ => ClickFilter::All,
        }
    }
}

/// One pickable mesh in the snapshot.
#[derive(Debug, Clone)]
pub struct ClickTarget {
    pub name: String,
    pub mesh: Arc<Mesh>,
    /// Mesh space to model-root space, excluding the root's own transform.
    pub local_to_root: Matrix4<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub name: String,
    pub distance: f32,
}

struct CollectTargets<'a> {
    filter: &'a ClickFilter,
    targets: Vec<ClickTarget>,
}

impl NodeVisitor for CollectTargets<'_> {
    fn visit_mesh(&mut self, node: &MeshNode, local_to_root: &Matrix4<f32>) {
        if self.filter.allows(&node.name) {
            self.targets.push(ClickTarget {
                name: node.name.clone(),
                mesh: Arc::clone(&node.mesh),
                local_to_root: *local_to_root,
            });
        }
    }
}

#[derive(Debug, Default)]
pub struct HitTestDispatcher {
    filter: ClickFilter,
    targets: Vec<ClickTarget>,
}

impl HitTestDispatcher {
    pub fn new(filter: ClickFilter) -> Self {
        Self {
            filter,
            targets: Vec::new(),
        }
    }

    pub fn filter(&self) -> &ClickFilter {
        &self.filter
    }

    /// Replaces the filter. The caller rebuilds the snapshot afterwards.
    pub fn set_filter(&mut self, filter: ClickFilter) {
        self.filter = filter;
    }

    /// Rebuilds the clickable snapshot from `graph`.
    pub fn rebuild(&mut self, graph: &SceneGraph) {
        let mut collector = CollectTargets {
            filter: &self.filter,
            targets: Vec::new(),
        };
        graph.visit(&mut collector);
        self.targets = collector.targets;
        debug!("clickable snapshot holds {} meshes", self.targets.len());
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    pub fn targets(&self) -> &[ClickTarget] {
        &self.targets
    }

    /// Nearest clickable mesh hit by `ray`, with the model root at `root`.
    pub fn pick(&self, ray: &Ray, root: &Matrix4<f32>) -> Option<PickResult> {
        let mut closest: Option<PickResult> = None;

        for target in &self.targets {
            let world = root * target.local_to_root;
            let Some(box_distance) = target.mesh.bounds().transformed(&world).intersect_ray(ray) else {
                continue;
            };
            if closest.as_ref().is_some_and(|c| box_distance > c.distance) {
                continue;
            }

            for [a, b, c] in target.mesh.triangles() {
                let hit = ray.intersect_triangle(
                    transform_point(&world, a),
                    transform_point(&world, b),
                    transform_point(&world, c),
                );
                if let Some(distance) = hit {
                    if closest.as_ref().map_or(true, |c| distance < c.distance) {
                        closest = Some(PickResult {
                            name: target.name.clone(),
                            distance,
                        });
                    }
                }
            }
        }

        closest
    }

    /// Resolves a window click to the nearest mesh, or `None` when the click
    /// is outside the surface or hits nothing.
    pub fn pick_at(
        &self,
        screen_pos: (f32, f32),
        rect: &SurfaceRect,
        camera: &PerspectiveCamera,
        root: &Matrix4<f32>,
    ) -> Option<PickResult> {
        if rect.is_empty() || !rect.contains(screen_pos.0, screen_pos.1) {
            return None;
        }
        let ray = screen_to_ray(screen_pos, rect, camera);
        self.pick(&ray, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        resources::material::Material,
        scene::{transform::Transform, SceneNode},
    };
    use cgmath::{SquareMatrix, Vector3};

    fn cube_node(name: &str, z: f32) -> SceneNode {
        let mut node = MeshNode::new(
            name,
            Arc::new(Mesh::cuboid([0.5, 0.5, 0.5])),
            Arc::new(Material::default()),
        );
        node.transform = Transform::identity().with_position(0.0, 0.0, z);
        SceneNode::Mesh(node)
    }

    fn two_cubes() -> SceneGraph {
        SceneGraph::group("root", vec![cube_node("far", -3.0), cube_node("near", 0.0)])
    }

    fn ray_down_z() -> Ray {
        Ray::new(Vector3::new(0.1, 0.2, 10.0), Vector3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut dispatcher = HitTestDispatcher::default();
        dispatcher.rebuild(&two_cubes());
        let hit = dispatcher.pick(&ray_down_z(), &Matrix4::identity()).unwrap();
        assert_eq!(hit.name, "near");
        assert!((hit.distance - 9.5).abs() < 1e-4);
    }

    #[test]
    fn test_filter_excludes_occluder() {
        let mut dispatcher = HitTestDispatcher::new(Some(vec!["far".to_string()]).into());
        dispatcher.rebuild(&two_cubes());
        assert_eq!(dispatcher.targets().len(), 1);
        let hit = dispatcher.pick(&ray_down_z(), &Matrix4::identity()).unwrap();
        assert_eq!(hit.name, "far");
    }

    #[test]
    fn test_filter_never_reports_unlisted_mesh() {
        let mut dispatcher = HitTestDispatcher::new(Some(vec!["X".to_string()]).into());
        dispatcher.rebuild(&two_cubes());
        assert!(dispatcher.pick(&ray_down_z(), &Matrix4::identity()).is_none());
    }

    #[test]
    fn test_empty_list_means_all() {
        assert_eq!(ClickFilter::from(Some(Vec::new())), ClickFilter::All);
        assert_eq!(ClickFilter::from(None), ClickFilter::All);
    }

    #[test]
    fn test_root_transform_moves_targets() {
        let mut dispatcher = HitTestDispatcher::default();
        dispatcher.rebuild(&SceneGraph::group("root", vec![cube_node("only", 0.0)]));
        let shifted = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0));
        assert!(dispatcher.pick(&ray_down_z(), &shifted).is_none());
    }

    #[test]
    fn test_click_outside_surface_is_ignored() {
        let mut dispatcher = HitTestDispatcher::default();
        dispatcher.rebuild(&two_cubes());
        let rect = SurfaceRect::new(100.0, 100.0, 200.0, 200.0);
        let camera = PerspectiveCamera::default();
        assert!(dispatcher
            .pick_at((10.0, 10.0), &rect, &camera, &Matrix4::identity())
            .is_none());
    }
}
