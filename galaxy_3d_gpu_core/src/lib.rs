/*!
# Galaxy 3D GPU Core

Command submission and pipeline-state caching for the Galaxy 3D engine.

This crate sits one layer above a single explicit, manually synchronized
GPU API (fences, explicit barriers, descriptor heaps). The API itself is
reached through the traits of [`native`]; a backend crate implements them.
A software backend ([`headless`]) ships with the crate for tests and
headless runs.

## Architecture

- **RenderDevice**: owns the command pools, the queue and the pipeline cache
- **CommandQueue**: submits batches and tracks them with one monotonic fence
- **CommandPool**: recycles allocators and lists once their fence is reached
- **GpuResourceTable**: heap and binding layout derived from shader reflection
- **PipelineStateCache**: builds each native pipeline at most once per key
*/

// Internal modules
mod error;
pub mod log;
pub mod native;
pub mod shader;
pub mod command;
pub mod pipeline;
pub mod device;
pub mod headless;

#[cfg(test)]
mod test_support;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Device and its configuration
    pub use crate::device::{
        RenderDevice, DeviceConfig, DeviceStats, ResourceTableKey,
        FrameTarget, DrawRequest, MaterialBinding, ResourceBindings, BoundResource,
    };

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Native seam sub-module
    pub mod native {
        pub use crate::native::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Command sub-module
    pub mod command {
        pub use crate::command::*;
    }

    // Pipeline sub-module
    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    // Headless backend sub-module
    pub mod headless {
        pub use crate::headless::*;
    }
}

pub use error::{Error, Result};

// Re-export math library at crate root
pub use glam;
