/// Command queue with a single monotonic fence
///
/// One queue and one fence give a total order over every submitted batch:
/// batch N is done once the fence's completed value reaches N. Pooled
/// objects are reclaimed only after the value they were submitted at is
/// observed, so the GPU is never reading memory that gets reset.

use crate::command::{CommandPool, PooledCommandAllocator, PooledCommandList, PooledObject};
use crate::error::{Error, Result};
use crate::native::{NativeCommandList, NativeCommandQueue, NativeDevice, NativeFence};
use crate::{engine_debug, engine_error, engine_trace};

/// Allocators and lists submitted together
#[derive(Debug, Default)]
pub struct SubmissionBatch {
    allocators: Vec<PooledCommandAllocator>,
    lists: Vec<PooledCommandList>,
}

impl SubmissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// One allocator and the list recorded through it
    pub fn single(allocator: PooledCommandAllocator, list: PooledCommandList) -> Self {
        let mut batch = Self::new();
        batch.push_allocator(allocator);
        batch.push_list(list);
        batch
    }

    pub fn push_allocator(&mut self, allocator: PooledCommandAllocator) {
        self.allocators.push(allocator);
    }

    /// Lists execute in push order
    pub fn push_list(&mut self, list: PooledCommandList) {
        self.lists.push(list);
    }

    pub fn allocators(&self) -> &[PooledCommandAllocator] {
        &self.allocators
    }

    pub fn lists(&self) -> &[PooledCommandList] {
        &self.lists
    }

    pub fn lists_mut(&mut self) -> &mut [PooledCommandList] {
        &mut self.lists
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Take the allocators and lists back, e.g. to return them to their pools
    pub fn into_parts(self) -> (Vec<PooledCommandAllocator>, Vec<PooledCommandList>) {
        (self.allocators, self.lists)
    }
}

pub struct CommandQueue {
    native: Box<dyn NativeCommandQueue>,
    fence: Box<dyn NativeFence>,
    /// Last value signaled; batch N signals N
    fence_target: u64,
    debug_name: String,
}

impl CommandQueue {
    /// Create the direct queue and its fence (starting at 0)
    pub fn new(device: &dyn NativeDevice, debug_name: &str) -> Result<Self> {
        let native = device.create_command_queue().map_err(|e| {
            engine_error!("galaxy3d::CommandQueue", "Failed to create command queue '{}': {}", debug_name, e);
            Error::InitializationFailed(format!("command queue: {}", e))
        })?;
        let fence = device.create_fence(0).map_err(|e| {
            engine_error!("galaxy3d::CommandQueue", "Failed to create fence for '{}': {}", debug_name, e);
            Error::InitializationFailed(format!("fence: {}", e))
        })?;

        Ok(Self {
            native,
            fence,
            fence_target: 0,
            debug_name: debug_name.to_string(),
        })
    }

    /// Submit a batch and signal the next fence value
    ///
    /// Closes every list still recording, submits the lists in order, then
    /// signals `last_signaled() + 1` and protects every allocator and list of
    /// the batch with that value. Returns the signaled value.
    pub fn execute(&mut self, batch: &mut SubmissionBatch) -> Result<u64> {
        for list in batch.lists.iter_mut() {
            list.close().map_err(|e| self.log_failure("close command list", e))?;
        }

        let natives: Vec<&dyn NativeCommandList> = batch.lists.iter().map(|l| l.native()).collect();
        self.native
            .execute_command_lists(&natives)
            .map_err(|e| self.log_failure("execute command lists", e))?;

        let value = self.fence_target + 1;
        self.native
            .signal(self.fence.as_ref(), value)
            .map_err(|e| self.log_failure("signal fence", e))?;
        self.fence_target = value;

        for allocator in batch.allocators.iter_mut() {
            allocator.protect(value);
        }
        for list in batch.lists.iter_mut() {
            list.protect(value);
        }

        engine_trace!("galaxy3d::CommandQueue", "'{}' submitted {} list(s) at fence {}",
            self.debug_name, batch.lists.len(), value);
        Ok(value)
    }

    /// Whether the GPU has reached the last signaled value
    pub fn is_completed(&self) -> bool {
        self.fence.completed_value() >= self.fence_target
    }

    /// Whether the GPU has reached `value`
    pub fn is_value_completed(&self, value: u64) -> bool {
        self.fence.completed_value() >= value
    }

    /// Last value the GPU has reached
    pub fn completed_value(&self) -> u64 {
        self.fence.completed_value()
    }

    /// Last value signaled (equals the number of executed batches)
    pub fn last_signaled(&self) -> u64 {
        self.fence_target
    }

    /// Block until the GPU reaches the last signaled value
    pub fn wait_for_completion(&self) -> Result<()> {
        self.wait_for_value(self.fence_target)
    }

    /// Block until the GPU reaches `value`
    pub fn wait_for_value(&self, value: u64) -> Result<()> {
        debug_assert!(value <= self.fence_target, "waiting for unsignaled fence value {}", value);
        if self.is_value_completed(value) {
            return Ok(());
        }
        engine_trace!("galaxy3d::CommandQueue", "'{}' waiting for fence {} (completed: {})",
            self.debug_name, value, self.fence.completed_value());
        self.fence
            .wait_for_value(value)
            .map_err(|e| self.log_failure("wait for fence", e))
    }

    /// Unprotect every pooled object whose submission has completed
    ///
    /// Returns the number of objects unprotected.
    pub fn update_execution_state<T: PooledObject>(&self, pool: &mut CommandPool<T>) -> usize {
        let count = pool.unprotect_completed(self.completed_value(), self.fence_target);
        if count > 0 {
            engine_debug!("galaxy3d::CommandQueue", "'{}' released {} pooled object(s) at fence {}",
                self.debug_name, count, self.completed_value());
        }
        count
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    fn log_failure(&self, action: &str, error: Error) -> Error {
        engine_error!("galaxy3d::CommandQueue", "'{}' failed to {}: {}", self.debug_name, action, error);
        error
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
