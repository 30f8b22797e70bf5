//! Surface materials
//!
//! Materials are plain data shared between mesh nodes through `Arc`. A loaded
//! asset may hand the same material to several meshes, so anything that wants
//! a different look derives a new material instead of editing the shared one.

use super::color::Color;

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    /// Drawn with the blended pipeline, after every opaque mesh.
    pub transparent: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            transparent: false,
        }
    }
}

impl Material {
    /// Material named `name`; any alpha below one makes it transparent.
    pub fn new(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            transparent: base_color[3] < 1.0,
        }
    }

    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color[0] = r;
        self.base_color[1] = g;
        self.base_color[2] = b;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.base_color[3] = alpha.clamp(0.0, 1.0);
        self.transparent = self.base_color[3] < 1.0;
        self
    }

    /// Base color this material would have after applying `color`.
    pub fn tinted_color(&self, color: &Color) -> [f32; 4] {
        color.to_rgba(self.base_color[3])
    }

    /// Independent copy of this material carrying `color`.
    pub fn tinted(&self, color: &Color) -> Self {
        let [r, g, b, a] = self.tinted_color(color);
        self.clone().with_color(r, g, b).with_alpha(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tinted_keeps_source_alpha() {
        let glass = Material::new("glass", [0.9, 0.9, 0.9, 0.4]);
        assert!(glass.transparent);
        let red = glass.tinted(&"#FF0000".parse().unwrap());
        assert_eq!(red.base_color, [1.0, 0.0, 0.0, 0.4]);
        assert_eq!(red.name, "glass");
        assert_eq!(glass.base_color, [0.9, 0.9, 0.9, 0.4]);
    }

    #[test]
    fn test_builder_clamps_alpha() {
        let material = Material::default().with_alpha(3.0);
        assert_eq!(material.base_color[3], 1.0);
        assert!(!material.transparent);
    }
}
