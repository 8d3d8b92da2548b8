/// Shader module - compiled shaders, reflection metadata and combinations

pub mod compiled_shader;
pub mod reflection;
pub mod combination;
pub mod constant_buffer;

pub use compiled_shader::*;
pub use reflection::*;
pub use combination::*;
pub use constant_buffer::*;
