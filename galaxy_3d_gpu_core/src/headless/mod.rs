/// Headless backend - a software implementation of the native seam
///
/// No GPU is involved. Commands are recorded as data, submissions are
/// collected for inspection, and the GPU timeline is simulated: fence
/// values are reached at once (`CompletionMode::Immediate`) or only when
/// the caller advances the timeline (`CompletionMode::Manual`), possibly
/// from another thread while the render thread blocks on a fence.

pub mod device;
pub mod timeline;
pub mod command;
pub mod resources;

pub use device::*;
pub use timeline::*;
pub use command::*;
pub use resources::*;

/// When the simulated GPU reaches signaled fence values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// Every signal completes as soon as it is issued
    #[default]
    Immediate,
    /// Signals stay pending until `complete_next` / `complete_all`
    Manual,
}

/// Headless backend configuration
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub completion: CompletionMode,
    /// Track resource states and report barriers whose `before` state
    /// does not match, like a native debug layer would
    pub validation: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            completion: CompletionMode::Immediate,
            validation: cfg!(debug_assertions),
        }
    }
}

impl HeadlessConfig {
    /// Manual timeline, validation per build profile
    pub fn manual() -> Self {
        Self {
            completion: CompletionMode::Manual,
            ..Self::default()
        }
    }
}
