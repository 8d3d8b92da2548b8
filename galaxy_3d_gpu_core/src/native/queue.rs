/// Native command queue and fence traits

use std::any::Any;
use crate::error::Result;
use crate::native::NativeCommandList;

/// Native GPU queue
///
/// Batches execute in submission order.
pub trait NativeCommandQueue: Send {
    /// Submit closed command lists for execution
    fn execute_command_lists(&mut self, lists: &[&dyn NativeCommandList]) -> Result<()>;

    /// Ask the GPU to set `fence` to `value` once all previously submitted work is done
    fn signal(&mut self, fence: &dyn NativeFence, value: u64) -> Result<()>;
}

/// GPU/CPU synchronization primitive with a monotonically increasing completed value
pub trait NativeFence: Send + Sync {
    /// Last value the GPU has reached
    fn completed_value(&self) -> u64;

    /// Block the calling thread until the GPU reaches `value`
    ///
    /// Implementations register a wake event for `value`; they never spin.
    fn wait_for_value(&self, value: u64) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
