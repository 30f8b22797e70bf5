//! Scene graph
//!
//! A loaded asset is a tree of nodes. Nodes are a closed set of variants and
//! traversal goes through typed visitors, so passes like recoloring and
//! clickable collection never need to downcast.

use cgmath::{Matrix4, SquareMatrix};
use std::sync::Arc;

use super::{mesh::Mesh, transform::Transform};
use crate::gfx::{picking::AABB, resources::material::Material};

#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Arc<Mesh>,
    /// Material currently rendered. Shared with other nodes until a pass
    /// derives a private copy.
    pub material: Arc<Material>,
    source_material: Arc<Material>,
    pub cast_shadow: bool,
}

impl MeshNode {
    pub fn new(name: &str, mesh: Arc<Mesh>, material: Arc<Material>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::identity(),
            mesh,
            cast_shadow: !material.transparent,
            source_material: Arc::clone(&material),
            material,
        }
    }

    /// Material the node was loaded with.
    pub fn source_material(&self) -> &Arc<Material> {
        &self.source_material
    }

    /// Whether the rendered material is a derived copy.
    pub fn is_overridden(&self) -> bool {
        !Arc::ptr_eq(&self.material, &self.source_material)
    }
}

#[derive(Debug, Clone)]
pub struct GroupNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
}

/// Anything that is neither geometry nor a group (empties, lights, cameras).
#[derive(Debug, Clone)]
pub struct OtherNode {
    pub name: String,
    pub transform: Transform,
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    Mesh(MeshNode),
    Group(GroupNode),
    Other(OtherNode),
}

impl SceneNode {
    pub fn name(&self) -> &str {
        match self {
            SceneNode::Mesh(n) => &n.name,
            SceneNode::Group(n) => &n.name,
            SceneNode::Other(n) => &n.name,
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            SceneNode::Mesh(n) => &n.transform,
            SceneNode::Group(n) => &n.transform,
            SceneNode::Other(n) => &n.transform,
        }
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            SceneNode::Mesh(n) => &mut n.transform,
            SceneNode::Group(n) => &mut n.transform,
            SceneNode::Other(n) => &mut n.transform,
        }
    }
}

/// Read-only traversal. `local_to_root` excludes the root's own transform.
pub trait NodeVisitor {
    fn visit_mesh(&mut self, _node: &MeshNode, _local_to_root: &Matrix4<f32>) {}
    fn visit_group(&mut self, _node: &GroupNode, _local_to_root: &Matrix4<f32>) {}
    fn visit_other(&mut self, _node: &OtherNode, _local_to_root: &Matrix4<f32>) {}
}

/// Mutating traversal.
pub trait NodeVisitorMut {
    fn visit_mesh(&mut self, _node: &mut MeshNode) {}
    fn visit_group(&mut self, _node: &mut GroupNode) {}
    fn visit_other(&mut self, _node: &mut OtherNode) {}
}

fn walk<V: NodeVisitor + ?Sized>(node: &SceneNode, matrix: Matrix4<f32>, visitor: &mut V) {
    match node {
        SceneNode::Mesh(mesh) => visitor.visit_mesh(mesh, &matrix),
        SceneNode::Other(other) => visitor.visit_other(other, &matrix),
        SceneNode::Group(group) => {
            visitor.visit_group(group, &matrix);
            for child in &group.children {
                walk(child, matrix * child.transform().matrix(), visitor);
            }
        }
    }
}

fn walk_mut<V: NodeVisitorMut + ?Sized>(node: &mut SceneNode, visitor: &mut V) {
    match node {
        SceneNode::Mesh(mesh) => visitor.visit_mesh(mesh),
        SceneNode::Other(other) => visitor.visit_other(other),
        SceneNode::Group(group) => {
            visitor.visit_group(group);
            for child in &mut group.children {
                walk_mut(child, visitor);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub root: SceneNode,
}

impl SceneGraph {
    pub fn new(root: SceneNode) -> Self {
        Self { root }
    }

    pub fn group(name: &str, children: Vec<SceneNode>) -> Self {
        Self::new(SceneNode::Group(GroupNode {
            name: name.to_string(),
            transform: Transform::identity(),
            children,
        }))
    }

    pub fn root_transform(&self) -> &Transform {
        self.root.transform()
    }

    pub fn root_transform_mut(&mut self) -> &mut Transform {
        self.root.transform_mut()
    }

    pub fn root_matrix(&self) -> Matrix4<f32> {
        self.root.transform().matrix()
    }

    pub fn visit<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) {
        walk(&self.root, Matrix4::identity(), visitor);
    }

    pub fn visit_mut<V: NodeVisitorMut + ?Sized>(&mut self, visitor: &mut V) {
        walk_mut(&mut self.root, visitor);
    }

    pub fn mesh_names(&self) -> Vec<String> {
        struct Names(Vec<String>);
        impl NodeVisitor for Names {
            fn visit_mesh(&mut self, node: &MeshNode, _: &Matrix4<f32>) {
                self.0.push(node.name.clone());
            }
        }
        let mut names = Names(Vec::new());
        self.visit(&mut names);
        names.0
    }

    pub fn find_mesh(&self, name: &str) -> Option<&MeshNode> {
        fn find<'a>(node: &'a SceneNode, name: &str) -> Option<&'a MeshNode> {
            match node {
                SceneNode::Mesh(mesh) if mesh.name == name => Some(mesh),
                SceneNode::Group(group) => group.children.iter().find_map(|c| find(c, name)),
                _ => None,
            }
        }
        find(&self.root, name)
    }

    /// Bounding box of every mesh vertex with the root transform applied.
    /// `None` when the graph has no geometry.
    pub fn world_bounds(&self) -> Option<AABB> {
        struct Bounds {
            root: Matrix4<f32>,
            total: Option<AABB>,
        }
        impl NodeVisitor for Bounds {
            fn visit_mesh(&mut self, node: &MeshNode, local_to_root: &Matrix4<f32>) {
                if node.mesh.vertices().is_empty() {
                    return;
                }
                let world = node.mesh.bounds().transformed(&(self.root * local_to_root));
                self.total = Some(match self.total {
                    Some(total) => total.union(&world),
                    None => world,
                });
            }
        }

        let mut bounds = Bounds {
            root: self.root_matrix(),
            total: None,
        };
        self.visit(&mut bounds);
        bounds.total
    }
}
