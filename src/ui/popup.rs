//! Which popup is open, and which mesh opens which popup

use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::config::InfoPanel;

pub const STORY_PANEL: &str = "story";
pub const INTERACTIVE_STORY_PANEL: &str = "interactive_story";

/// Windows narrower than this get the compact menu instead of 3D clicks.
pub const COMPACT_BREAKPOINT: f32 = 768.0;

pub fn is_compact(width: f32) -> bool {
    width < COMPACT_BREAKPOINT
}

/// One line of the compact menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl MenuEntry {
    fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Mesh name to panel id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelRoutes {
    routes: BTreeMap<String, String>,
}

impl PanelRoutes {
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self { routes }
    }

    /// Panel opened by a click on `mesh`. Unrouted meshes return `None`.
    pub fn route(&self, mesh: &str) -> Option<&str> {
        let panel = self.routes.get(mesh).map(String::as_str);
        if panel.is_none() {
            debug!("no panel routed for mesh '{}'", mesh);
        }
        panel
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Tracks the single popup shown over the viewer.
#[derive(Debug, Clone)]
pub struct PopupOrchestrator {
    menu: Vec<MenuEntry>,
    active: Option<String>,
}

impl PopupOrchestrator {
    /// Knows the two story panels plus every manifest info panel.
    pub fn new(info_panels: &BTreeMap<String, InfoPanel>) -> Self {
        let mut menu = vec![
            MenuEntry::new(
                STORY_PANEL,
                "Story Generator",
                "Let AI write a short story from your prompt.",
            ),
            MenuEntry::new(
                INTERACTIVE_STORY_PANEL,
                "Interactive Story",
                "A story where you make the choices.",
            ),
        ];
        menu.extend(
            info_panels
                .iter()
                .map(|(id, panel)| MenuEntry::new(id, &panel.title, &panel.description)),
        );
        Self { menu, active: None }
    }

    /// Opens `panel_id`, replacing whatever was open. Unknown ids are ignored.
    pub fn open(&mut self, panel_id: &str) -> bool {
        if !self.menu.iter().any(|entry| entry.id == panel_id) {
            warn!("ignoring request to open unknown panel '{}'", panel_id);
            return false;
        }
        if self.active.as_deref() != Some(panel_id) {
            info!("popup opened: {}", panel_id);
            self.active = Some(panel_id.to_string());
        }
        true
    }

    /// Opens the panel routed from `mesh`, if any.
    pub fn open_for_mesh(&mut self, routes: &PanelRoutes, mesh: &str) -> bool {
        match routes.route(mesh) {
            Some(panel) => self.open(panel),
            None => false,
        }
    }

    pub fn close(&mut self) {
        if let Some(panel) = self.active.take() {
            info!("popup closed: {}", panel);
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn menu(&self) -> &[MenuEntry] {
        &self.menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> PopupOrchestrator {
        let panels = BTreeMap::from([(
            "future1".to_string(),
            InfoPanel::new("Future One", "Details", "Upcoming"),
        )]);
        PopupOrchestrator::new(&panels)
    }

    fn routes() -> PanelRoutes {
        PanelRoutes::new(BTreeMap::from([
            ("1".to_string(), STORY_PANEL.to_string()),
            ("3".to_string(), INTERACTIVE_STORY_PANEL.to_string()),
        ]))
    }

    #[test]
    fn test_menu_lists_story_panels_then_info_panels() {
        let popups = orchestrator();
        let ids: Vec<&str> = popups.menu().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![STORY_PANEL, INTERACTIVE_STORY_PANEL, "future1"]);
        assert_eq!(popups.menu()[2].description, "Upcoming");
    }

    #[test]
    fn test_open_and_close() {
        let mut popups = orchestrator();
        assert!(!popups.is_open());
        assert!(popups.open("future1"));
        assert_eq!(popups.active(), Some("future1"));
        assert!(popups.open(STORY_PANEL));
        assert_eq!(popups.active(), Some(STORY_PANEL));
        popups.close();
        assert!(popups.active().is_none());
        popups.close();
        assert!(!popups.is_open());
    }

    #[test]
    fn test_unknown_panel_is_ignored() {
        let mut popups = orchestrator();
        popups.open(STORY_PANEL);
        assert!(!popups.open("nope"));
        assert_eq!(popups.active(), Some(STORY_PANEL));
    }

    #[test]
    fn test_mesh_routing() {
        let mut popups = orchestrator();
        let routes = routes();
        assert!(!popups.open_for_mesh(&routes, "3001"));
        assert!(!popups.is_open());
        assert!(popups.open_for_mesh(&routes, "3"));
        assert_eq!(popups.active(), Some(INTERACTIVE_STORY_PANEL));
    }

    #[test]
    fn test_compact_breakpoint() {
        assert!(is_compact(767.0));
        assert!(!is_compact(768.0));
    }
}
