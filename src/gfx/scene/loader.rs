//! Asset loading
//!
//! Turns model files into [`SceneAsset`]s. Loaded assets are immutable and
//! shared; every viewer clones the graph it displays, which copies node data
//! but keeps geometry and materials shared.

use log::{info, warn};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

use super::{
    graph::{MeshNode, SceneGraph, SceneNode},
    mesh::Mesh,
};
use crate::gfx::resources::material::Material;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read OBJ at {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("asset {path} contains no meshes")]
    Empty { path: PathBuf },
    #[error("unsupported asset format `{extension}` for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },
}

/// A loaded model, ready to be instantiated by viewers.
#[derive(Debug, Clone)]
pub struct SceneAsset {
    pub path: PathBuf,
    pub graph: SceneGraph,
}

/// Where the viewer's asset currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed(String),
}

pub trait AssetLoader {
    fn load(&self, path: &Path) -> Result<SceneAsset, AssetError>;
}

/// Wavefront OBJ loader. Each OBJ object or group becomes one mesh node named
/// after it, under a root group named after the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjLoader;

impl ObjLoader {
    fn material_from_mtl(index: usize, mtl: &tobj::Material) -> Material {
        let name = if mtl.name.is_empty() {
            format!("material_{}", index)
        } else {
            mtl.name.clone()
        };
        let [r, g, b] = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
        Material::new(&name, [r, g, b, mtl.dissolve.unwrap_or(1.0)])
    }
}

impl AssetLoader for ObjLoader {
    fn load(&self, path: &Path) -> Result<SceneAsset, AssetError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if extension != "obj" {
            return Err(AssetError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            });
        }

        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| AssetError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|e| {
            warn!("no usable MTL for {}: {e}, using default materials", path.display());
            Vec::new()
        });

        // One Arc per MTL entry so meshes sharing a material share the Arc.
        let materials: Vec<Arc<Material>> = materials
            .iter()
            .enumerate()
            .map(|(i, mtl)| Arc::new(Self::material_from_mtl(i, mtl)))
            .collect();
        let default_material = Arc::new(Material::default());

        let children: Vec<SceneNode> = models
            .iter()
            .enumerate()
            .filter(|(_, model)| model.mesh.indices.len() >= 3)
            .map(|(i, model)| {
                let name = if model.name.is_empty() {
                    format!("mesh_{}", i)
                } else {
                    model.name.clone()
                };
                let mesh = Mesh::new(
                    &model.mesh.positions,
                    &model.mesh.normals,
                    model.mesh.indices.clone(),
                );
                let material = model
                    .mesh
                    .material_id
                    .and_then(|id| materials.get(id))
                    .unwrap_or(&default_material);
                SceneNode::Mesh(MeshNode::new(&name, Arc::new(mesh), Arc::clone(material)))
            })
            .collect();

        if children.is_empty() {
            return Err(AssetError::Empty {
                path: path.to_path_buf(),
            });
        }

        let root_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("asset");
        info!(
            "loaded {} ({} meshes, {} materials)",
            path.display(),
            children.len(),
            materials.len()
        );

        Ok(SceneAsset {
            path: path.to_path_buf(),
            graph: SceneGraph::group(root_name, children),
        })
    }
}

/// Shares loaded assets by path.
pub struct AssetCache {
    loader: Box<dyn AssetLoader>,
    entries: HashMap<PathBuf, Arc<SceneAsset>>,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new(Box::new(ObjLoader))
    }
}

impl AssetCache {
    pub fn new(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<SceneAsset>, AssetError> {
        if let Some(asset) = self.entries.get(path) {
            return Ok(Arc::clone(asset));
        }
        let asset = Arc::new(self.loader.load(path)?);
        self.entries.insert(path.to_path_buf(), Arc::clone(&asset));
        Ok(asset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    const TWO_QUADS: &str = "\
o 1
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
o 3
v 2 0 0
v 3 0 0
v 3 1 0
f 5 6 7
";

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vitrine-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_obj_objects_become_named_mesh_nodes() {
        let path = write_temp("two_quads.obj", TWO_QUADS);
        let asset = ObjLoader.load(&path).unwrap();

        assert_eq!(asset.graph.mesh_names(), vec!["1".to_string(), "3".to_string()]);
        let quad = asset.graph.find_mesh("1").unwrap();
        assert_eq!(quad.mesh.triangles().count(), 2);
        assert_eq!(quad.material.name, "Default");
        assert!(quad.cast_shadow);
    }

    #[test]
    fn test_mtl_diffuse_and_dissolve_become_material() {
        let glass = tobj::Material {
            name: "glass".to_string(),
            diffuse: Some([0.2, 0.4, 0.6]),
            dissolve: Some(0.35),
            shininess: Some(96.0),
            ..Default::default()
        };
        let material = ObjLoader::material_from_mtl(0, &glass);
        assert_eq!(material, Material::new("glass", [0.2, 0.4, 0.6, 0.35]));
        assert!(material.transparent);

        let unnamed = ObjLoader::material_from_mtl(2, &tobj::Material::default());
        assert_eq!(unnamed.name, "material_2");
        assert_eq!(unnamed.base_color, [0.8, 0.8, 0.8, 1.0]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = ObjLoader
            .load(Path::new("/definitely/not/here.obj"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ObjLoader.load(Path::new("bookshelf1.glb")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat { ref extension, .. } if extension == "glb"));
    }

    struct CountingLoader(Rc<Cell<usize>>);

    impl AssetLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<SceneAsset, AssetError> {
            self.0.set(self.0.get() + 1);
            Ok(SceneAsset {
                path: path.to_path_buf(),
                graph: SceneGraph::group("empty", Vec::new()),
            })
        }
    }

    #[test]
    fn test_cache_loads_once_per_path() {
        let loads = Rc::new(Cell::new(0));
        let mut cache = AssetCache::new(Box::new(CountingLoader(loads.clone())));

        let a = cache.get_or_load(Path::new("a.obj")).unwrap();
        let again = cache.get_or_load(Path::new("a.obj")).unwrap();
        cache.get_or_load(Path::new("b.obj")).unwrap();

        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(loads.get(), 2);
        assert_eq!(cache.len(), 2);
    }
}
