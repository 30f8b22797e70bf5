pub mod color;
pub mod global_bindings;
pub mod material;
pub mod depth_buffer;
pub mod shadow_map;

pub use color::{Color, ColorParseError};
pub use material::Material;
