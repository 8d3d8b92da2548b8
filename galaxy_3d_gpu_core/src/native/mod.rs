/// Native module - the trait seam to a single explicit GPU command API
///
/// Every type the core hands to the graphics API goes through these traits.
/// A backend (the headless one in this crate, or a D3D12/Vulkan one in a
/// separate crate) implements them; the core never names a concrete backend.

// Module declarations
pub mod native_device;
pub mod command_list;
pub mod queue;
pub mod pipeline;
pub mod binding_layout;
pub mod fixed_function;
pub mod buffer;
pub mod texture;
pub mod resource_heap;
pub mod resource_state;

// Re-export everything
pub use native_device::*;
pub use command_list::*;
pub use queue::*;
pub use pipeline::*;
pub use binding_layout::*;
pub use fixed_function::*;
pub use buffer::*;
pub use texture::*;
pub use resource_heap::*;
pub use resource_state::*;
