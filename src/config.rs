//! Viewer and site configuration
//!
//! [`ViewerConfig`] is what one [`ModelViewer`](crate::viewer::ModelViewer)
//! needs. [`SiteManifest`] is the JSON description of a whole showcase page:
//! the viewer config plus window, popup routing and API settings.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    controls::{
        Axis, ControlSpec, InputSource, MappingPreset, TransformControl, TransformKind,
        TransformTarget,
    },
    gfx::{resources::color::Color, scene::paint::PaintRule},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest{}: {source}", location(path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

/// Everything one viewer instance is configured with.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub objects_to_paint: Vec<PaintRule>,
    pub obj_to_display: PathBuf,
    pub transform_controls: Vec<TransformControl>,
    pub scroll_value: Option<f32>,
    /// `None` (or an empty list) makes every mesh clickable.
    pub clickable_objects: Option<Vec<String>>,
}

impl ViewerConfig {
    pub fn new(obj_to_display: impl Into<PathBuf>) -> Self {
        Self {
            objects_to_paint: Vec::new(),
            obj_to_display: obj_to_display.into(),
            transform_controls: Vec::new(),
            scroll_value: None,
            clickable_objects: None,
        }
    }

    pub fn with_paint_rules(mut self, rules: Vec<PaintRule>) -> Self {
        self.objects_to_paint = rules;
        self
    }

    pub fn with_transform_controls(mut self, controls: Vec<TransformControl>) -> Self {
        self.transform_controls = controls;
        self
    }

    pub fn with_scroll_value(mut self, scroll: Option<f32>) -> Self {
        self.scroll_value = scroll;
        self
    }

    pub fn with_clickable_objects(mut self, names: Option<Vec<String>>) -> Self {
        self.clickable_objects = names;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Static text panel opened from a mesh click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoPanel {
    pub title: String,
    pub body: String,
    /// One line shown under the title in the compact menu.
    #[serde(default)]
    pub description: String,
}

impl InfoPanel {
    pub fn new(title: &str, body: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            description: description.to_string(),
        }
    }
}

fn default_title() -> String {
    "vitrine".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// JSON description of a showcase page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteManifest {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub window: WindowSpec,
    pub asset: PathBuf,
    #[serde(default)]
    pub paint: Vec<PaintRule>,
    #[serde(default)]
    pub controls: Vec<ControlSpec>,
    #[serde(default)]
    pub clickable: Option<Vec<String>>,
    /// Mesh name to panel id.
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
    #[serde(default)]
    pub info_panels: BTreeMap<String, InfoPanel>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Directory relative asset paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl SiteManifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: SiteManifest =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            })?;
        manifest.base_dir = path.parent().map(Path::to_path_buf);
        log::info!("Loaded site manifest {}", path.display());
        Ok(manifest)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })
    }

    /// The bookshelf landing page: three books, two of which open story panels.
    pub fn default_site() -> Self {
        let mouse = |kind: TransformKind, axis: Axis, value: f32| ControlSpec {
            target: TransformTarget::new(kind, axis),
            source: InputSource::Pointer,
            mapping: MappingPreset::Constant { value },
        };

        Self {
            title: "vitrine".to_string(),
            window: WindowSpec::default(),
            asset: PathBuf::from("demos/bookshelf.obj"),
            paint: vec![
                PaintRule::new("1", Color::rgb(1.0, 87.0 / 255.0, 51.0 / 255.0)),
                PaintRule::new("3", Color::rgb(51.0 / 255.0, 1.0, 1.0)),
                PaintRule::new("3001", Color::rgb(46.0 / 255.0, 1.0, 64.0 / 255.0)),
            ],
            controls: vec![
                mouse(TransformKind::Rotation, Axis::X, 0.0),
                mouse(TransformKind::Position, Axis::X, -1.125),
                mouse(TransformKind::Position, Axis::Z, -1.125),
                mouse(TransformKind::Rotation, Axis::Y, -1.57),
            ],
            clickable: None,
            routes: BTreeMap::from([
                ("1".to_string(), "story".to_string()),
                ("3".to_string(), "interactive_story".to_string()),
            ]),
            info_panels: BTreeMap::from([
                (
                    "future1".to_string(),
                    InfoPanel::new(
                        "Project \"Future One\"",
                        "Project \"Future One\" Details",
                        "Discover the details of this upcoming feature.",
                    ),
                ),
                (
                    "future2".to_string(),
                    InfoPanel::new(
                        "Project \"Future Two\"",
                        "Project \"Future Two\" Details",
                        "Learn more about another secret project.",
                    ),
                ),
            ]),
            api_base_url: default_api_base_url(),
            base_dir: None,
        }
    }

    /// Asset path, resolved against the manifest's directory when relative.
    pub fn asset_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) if self.asset.is_relative() => dir.join(&self.asset),
            _ => self.asset.clone(),
        }
    }

    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig::new(self.asset_path())
            .with_paint_rules(self.paint.clone())
            .with_transform_controls(self.controls.iter().cloned().map(Into::into).collect())
            .with_clickable_objects(self.clickable.clone())
    }
}
