/// Device module - the render device and the per-frame recording helpers built on it

pub mod render_device;
pub mod material;
pub mod frame;
pub mod draw;

pub use render_device::*;
pub use material::*;
pub use frame::*;
pub use draw::*;
