//! Material recolor pass
//!
//! Applies a declarative table of `mesh name -> color` to every mesh node.
//! An exact name match wins over the [`ALL_MESHES`] fallback; meshes matched
//! by neither keep, or go back to, the material they were loaded with.

use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::graph::{MeshNode, NodeVisitorMut, SceneGraph};
use crate::gfx::resources::color::Color;

/// Rule name that applies to every mesh without an exact rule.
pub const ALL_MESHES: &str = "ALLMESH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintRule {
    #[serde(rename = "mesh")]
    pub mesh_name: String,
    pub color: Color,
}

impl PaintRule {
    pub fn new(mesh_name: &str, color: Color) -> Self {
        Self {
            mesh_name: mesh_name.to_string(),
            color,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.mesh_name == ALL_MESHES
    }
}

/// Rule that applies to `mesh_name`, if any.
pub fn rule_for<'a>(rules: &'a [PaintRule], mesh_name: &str) -> Option<&'a PaintRule> {
    rules
        .iter()
        .find(|r| r.mesh_name == mesh_name)
        .or_else(|| rules.iter().find(|r| r.is_fallback()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// Nodes that received a freshly derived material.
    pub painted: usize,
    /// Nodes already carrying the requested color.
    pub unchanged: usize,
    /// Nodes no rule applied to.
    pub untouched: usize,
    /// Nodes no rule applied to whose earlier override was dropped.
    pub restored: usize,
}

struct RecolorPass<'a> {
    rules: &'a [PaintRule],
    report: PaintReport,
}

impl NodeVisitorMut for RecolorPass<'_> {
    fn visit_mesh(&mut self, node: &mut MeshNode) {
        let Some(rule) = rule_for(self.rules, &node.name) else {
            if node.is_overridden() {
                node.material = Arc::clone(node.source_material());
                self.report.restored += 1;
            } else {
                self.report.untouched += 1;
            }
            return;
        };

        let wanted = node.source_material().tinted_color(&rule.color);
        if node.is_overridden() && node.material.base_color == wanted {
            self.report.unchanged += 1;
            return;
        }

        node.material = Arc::new(node.source_material().tinted(&rule.color));
        self.report.painted += 1;
    }
}

/// Recolors `graph` in place. Shared source materials are never modified;
/// every painted node gets its own copy. Running the pass again with the same
/// rules allocates nothing.
pub fn apply_paint_rules(graph: &mut SceneGraph, rules: &[PaintRule]) -> PaintReport {
    let mut pass = RecolorPass {
        rules,
        report: PaintReport::default(),
    };
    graph.visit_mut(&mut pass);
    debug!("paint pass: {:?}", pass.report);
    pass.report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        resources::material::Material,
        scene::{mesh::Mesh, SceneNode},
    };

    fn shared_scene(names: &[&str]) -> (SceneGraph, Arc<Material>) {
        let shared = Arc::new(Material::default());
        let mesh = Arc::new(Mesh::cuboid([1.0; 3]));
        let children = names
            .iter()
            .map(|n| SceneNode::Mesh(MeshNode::new(n, Arc::clone(&mesh), Arc::clone(&shared))))
            .collect();
        (SceneGraph::group("root", children), shared)
    }

    fn color(hex: &str) -> Color {
        hex.parse().unwrap()
    }

    #[test]
    fn test_fallback_precedence() {
        let (mut graph, _) = shared_scene(&["A", "B"]);
        let c1 = color("#FF0000");
        let c2 = color("#00FF00");
        apply_paint_rules(
            &mut graph,
            &[PaintRule::new("A", c1), PaintRule::new(ALL_MESHES, c2)],
        );
        assert_eq!(graph.find_mesh("A").unwrap().material.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(graph.find_mesh("B").unwrap().material.base_color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_exact_match_wins_regardless_of_order() {
        let (mut graph, _) = shared_scene(&["A"]);
        apply_paint_rules(
            &mut graph,
            &[
                PaintRule::new(ALL_MESHES, color("#00FF00")),
                PaintRule::new("A", color("#0000FF")),
            ],
        );
        assert_eq!(graph.find_mesh("A").unwrap().material.base_color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_shared_material_is_never_mutated() {
        let (mut graph, shared) = shared_scene(&["A", "B"]);
        apply_paint_rules(&mut graph, &[PaintRule::new("A", color("#FF0000"))]);

        assert_eq!(*shared, Material::default());
        let b = graph.find_mesh("B").unwrap();
        assert!(Arc::ptr_eq(&b.material, &shared));
        assert!(!Arc::ptr_eq(&graph.find_mesh("A").unwrap().material, &shared));
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let (mut graph, _) = shared_scene(&["A", "B", "C"]);
        let rules = [PaintRule::new(ALL_MESHES, color("#2EFF40"))];

        let first = apply_paint_rules(&mut graph, &rules);
        assert_eq!(first.painted, 3);
        let painted = Arc::clone(&graph.find_mesh("A").unwrap().material);

        let second = apply_paint_rules(&mut graph, &rules);
        assert_eq!(
            second,
            PaintReport {
                painted: 0,
                unchanged: 3,
                untouched: 0,
                restored: 0
            }
        );
        assert!(Arc::ptr_eq(&painted, &graph.find_mesh("A").unwrap().material));
        assert_eq!(Arc::strong_count(&painted), 2);
    }

    #[test]
    fn test_unmatched_mesh_keeps_material() {
        let (mut graph, shared) = shared_scene(&["Z"]);
        let report = apply_paint_rules(&mut graph, &[PaintRule::new("A", color("#FF0000"))]);
        assert_eq!(report.untouched, 1);
        assert!(Arc::ptr_eq(&graph.find_mesh("Z").unwrap().material, &shared));
    }

    #[test]
    fn test_dropped_rule_restores_source_material() {
        let (mut graph, shared) = shared_scene(&["A", "B"]);
        apply_paint_rules(&mut graph, &[PaintRule::new("A", color("#FF0000"))]);
        assert_eq!(graph.find_mesh("A").unwrap().material.base_color, [1.0, 0.0, 0.0, 1.0]);

        let report = apply_paint_rules(&mut graph, &[]);
        assert_eq!(report.restored, 1);
        assert_eq!(report.untouched, 1);
        let a = graph.find_mesh("A").unwrap();
        assert!(Arc::ptr_eq(&a.material, &shared));
        assert!(!a.is_overridden());
    }

    #[test]
    fn test_rule_from_json() {
        let rule: PaintRule = serde_json::from_str(r##"{"mesh": "3001", "color": "#2EFF40"}"##).unwrap();
        assert_eq!(rule.mesh_name, "3001");
        assert_eq!(rule.color, color("#2EFF40"));
    }
}
