pub mod graph;
pub mod loader;
pub mod mesh;
pub mod paint;
pub mod transform;
pub mod vertex;

pub use graph::{GroupNode, MeshNode, NodeVisitor, NodeVisitorMut, OtherNode, SceneGraph, SceneNode};
pub use loader::{AssetCache, AssetError, AssetLoader, LoadState, ObjLoader, SceneAsset};
pub use paint::{apply_paint_rules, PaintReport, PaintRule, ALL_MESHES};
pub use transform::Transform;
