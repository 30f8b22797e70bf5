//! Addressing of transform scalars and the input sources that drive them

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Rotation,
    Scale,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One scalar of a [`Transform`](crate::gfx::scene::transform::Transform),
/// written `"rotation.x"`, `"position.z"` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransformTarget {
    pub kind: TransformKind,
    pub axis: Axis,
}

impl TransformTarget {
    pub const fn new(kind: TransformKind, axis: Axis) -> Self {
        Self { kind, axis }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetParseError {
    #[error("malformed transform target `{0}`, expected `<kind>.<axis>`")]
    Malformed(String),
    #[error("unknown transform kind `{0}`")]
    UnknownKind(String),
    #[error("unknown axis `{0}`")]
    UnknownAxis(String),
    #[error("unknown input source `{0}`")]
    UnknownSource(String),
}

impl FromStr for TransformTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, axis) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| TargetParseError::Malformed(s.to_string()))?;

        let kind = match kind {
            "rotation" => TransformKind::Rotation,
            "scale" => TransformKind::Scale,
            "position" => TransformKind::Position,
            other => return Err(TargetParseError::UnknownKind(other.to_string())),
        };
        let axis = match axis {
            "x" => Axis::X,
            "y" => Axis::Y,
            "z" => Axis::Z,
            other => return Err(TargetParseError::UnknownAxis(other.to_string())),
        };

        Ok(Self { kind, axis })
    }
}

impl TryFrom<String> for TransformTarget {
    type Error = TargetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransformTarget> for String {
    fn from(target: TransformTarget) -> Self {
        target.to_string()
    }
}

impl fmt::Display for TransformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TransformKind::Rotation => "rotation",
            TransformKind::Scale => "scale",
            TransformKind::Position => "position",
        };
        let axis = match self.axis {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        write!(f, "{kind}.{axis}")
    }
}

/// Which sampled signal feeds a control entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    #[serde(alias = "mouse")]
    Pointer,
    Scroll,
    Touch,
    None,
}

impl FromStr for InputSource {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mouse" | "pointer" => Ok(InputSource::Pointer),
            "scroll" => Ok(InputSource::Scroll),
            "touch" => Ok(InputSource::Touch),
            "none" => Ok(InputSource::None),
            other => Err(TargetParseError::UnknownSource(other.to_string())),
        }
    }
}
