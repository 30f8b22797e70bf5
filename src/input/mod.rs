//! Input sampling and listener plumbing

pub mod events;
pub mod listeners;
pub mod sampler;
pub mod scroll;

pub use events::{EventKind, InputEvent, WinitTranslator};
pub use listeners::{InputEvents, ListenerGuard};
pub use sampler::{InputSampler, SampledInput, TouchSample};
pub use scroll::ScrollTracker;
