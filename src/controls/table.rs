//! Transform control table
//!
//! Each entry binds one transform scalar to an input source through a mapping
//! function. Mappings are plain closures so callers can express any curve;
//! [`MappingPreset`] covers the curves a site manifest can declare.

use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use super::target::{InputSource, TransformTarget};
use crate::input::sampler::TouchSample;

/// The resolved input a mapping receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputValue {
    Pointer(Vector2<f32>),
    Scroll(f32),
    Touch(TouchSample),
}

/// Component selector for presets reading a 2D input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAxis {
    X,
    Y,
}

impl InputValue {
    /// Extracts one scalar. Scroll values ignore `axis`.
    pub fn component(&self, axis: InputAxis) -> f32 {
        match (self, axis) {
            (InputValue::Pointer(p), InputAxis::X) => p.x,
            (InputValue::Pointer(p), InputAxis::Y) => p.y,
            (InputValue::Touch(t), InputAxis::X) => t.position.x,
            (InputValue::Touch(t), InputAxis::Y) => t.position.y,
            (InputValue::Scroll(s), _) => *s,
        }
    }
}

/// Pure function from input to target scalar, evaluated every tick.
pub type Mapping = Arc<dyn Fn(&InputValue) -> f32 + Send + Sync>;

#[derive(Clone)]
pub struct TransformControl {
    pub target: TransformTarget,
    pub source: InputSource,
    pub mapping: Mapping,
}

impl TransformControl {
    pub fn new<F>(target: TransformTarget, source: InputSource, mapping: F) -> Self
    where
        F: Fn(&InputValue) -> f32 + Send + Sync + 'static,
    {
        Self {
            target,
            source,
            mapping: Arc::new(mapping),
        }
    }

    /// Entry that steers `target` toward a fixed value whenever `source` is live.
    pub fn constant(target: TransformTarget, source: InputSource, value: f32) -> Self {
        Self::new(target, source, move |_| value)
    }

    pub fn evaluate(&self, input: &InputValue) -> f32 {
        (self.mapping)(input)
    }
}

impl fmt::Debug for TransformControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformControl")
            .field("target", &self.target)
            .field("source", &self.source)
            .field("mapping", &"<fn>")
            .finish()
    }
}

fn one() -> f32 {
    1.0
}

/// Mapping curves that can be declared in data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingPreset {
    Constant {
        value: f32,
    },
    /// `v * scale + offset`
    Linear {
        axis: InputAxis,
        #[serde(default = "one")]
        scale: f32,
        #[serde(default)]
        offset: f32,
    },
    /// `sign(v) * |v|^exponent * scale + offset`
    SignedPower {
        axis: InputAxis,
        exponent: f32,
        #[serde(default = "one")]
        scale: f32,
        #[serde(default)]
        offset: f32,
    },
}

impl MappingPreset {
    pub fn evaluate(&self, input: &InputValue) -> f32 {
        match *self {
            MappingPreset::Constant { value } => value,
            MappingPreset::Linear { axis, scale, offset } => {
                input.component(axis) * scale + offset
            }
            MappingPreset::SignedPower {
                axis,
                exponent,
                scale,
                offset,
            } => {
                let v = input.component(axis);
                if v == 0.0 {
                    return offset;
                }
                v.signum() * v.abs().powf(exponent) * scale + offset
            }
        }
    }

    pub fn into_mapping(self) -> Mapping {
        Arc::new(move |input: &InputValue| self.evaluate(input))
    }
}

/// Serializable form of a [`TransformControl`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub target: TransformTarget,
    pub source: InputSource,
    pub mapping: MappingPreset,
}

impl From<ControlSpec> for TransformControl {
    fn from(spec: ControlSpec) -> Self {
        Self {
            target: spec.target,
            source: spec.source,
            mapping: spec.mapping.into_mapping(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_constant_ignores_input() {
        let control = TransformControl::constant(
            "rotation.x".parse().unwrap(),
            InputSource::Pointer,
            0.25,
        );
        assert_eq!(control.evaluate(&InputValue::Pointer(Vector2::new(0.9, -0.3))), 0.25);
        assert_eq!(control.evaluate(&InputValue::Scroll(12.0)), 0.25);
    }

    #[test]
    fn test_signed_power_curve() {
        let preset = MappingPreset::SignedPower {
            axis: InputAxis::X,
            exponent: 0.5,
            scale: PI / 6.0,
            offset: -PI / 4.0,
        };
        let right = preset.evaluate(&InputValue::Pointer(Vector2::new(0.25, 0.0)));
        let left = preset.evaluate(&InputValue::Pointer(Vector2::new(-0.25, 0.0)));
        assert!((right - (0.5 * PI / 6.0 - PI / 4.0)).abs() < 1e-6);
        assert!((left - (-0.5 * PI / 6.0 - PI / 4.0)).abs() < 1e-6);
        let centre = preset.evaluate(&InputValue::Pointer(Vector2::new(0.0, 0.0)));
        assert!((centre + PI / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_control_spec_from_json() {
        let json = r#"{
            "target": "rotation.y",
            "source": "mouse",
            "mapping": { "kind": "linear", "axis": "y", "scale": 2.0 }
        }"#;
        let spec: ControlSpec = serde_json::from_str(json).unwrap();
        let control = TransformControl::from(spec);
        let value = control.evaluate(&InputValue::Pointer(Vector2::new(0.0, 0.5)));
        assert!((value - 1.0).abs() < 1e-6);
    }
}
