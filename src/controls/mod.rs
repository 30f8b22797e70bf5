//! Declarative input-to-transform controls

pub mod integrator;
pub mod table;
pub mod target;

pub use integrator::{Integrator, SMOOTHING_FACTOR};
pub use table::{ControlSpec, InputAxis, InputValue, Mapping, MappingPreset, TransformControl};
pub use target::{Axis, InputSource, TargetParseError, TransformKind, TransformTarget};
