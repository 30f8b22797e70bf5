//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the viewer.
//!
//! - [`UiManager`] owns the ImGui context and its winit/wgpu integration.
//! - [`PopupOrchestrator`] tracks which popup is open; [`PanelRoutes`] maps
//!   clicked meshes to popups.
//! - [`Panels`] draws the story generator, the interactive story, the
//!   manifest's info panels and the compact menu used by narrow windows.
//!
//! While a popup is open, or ImGui wants the mouse, clicks never reach the
//! viewer's hit test.

pub mod manager;
pub mod panels;
pub mod popup;

pub use manager::UiManager;
pub use panels::Panels;
pub use popup::{is_compact, MenuEntry, PanelRoutes, PopupOrchestrator};
