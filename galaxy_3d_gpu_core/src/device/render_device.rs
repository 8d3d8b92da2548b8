/// Render device
///
/// Root owner of the command pools, the single command queue, the
/// pipeline state cache and the per-combination resource tables. Passed
/// explicitly to whatever records commands; there is no global device.
///
/// Single-threaded by contract: every method takes `&self` or `&mut self`
/// on one instance, and callers recording from several threads must wrap
/// the device in their own lock.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::command::{
    AllocatorId, CommandPool, CommandQueue, PooledCommandAllocator, PooledCommandList,
    PooledObject, SubmissionBatch,
};
use crate::error::{Error, Result};
use crate::native::{
    BufferDesc, BufferUsage, FixedFunctionState, NativeBindingLayout, NativeBuffer,
    NativeDevice, NativePipeline, NativeResourceHeap, NativeTexture, ResourceHeapDesc, TextureDesc,
};
use crate::pipeline::{GpuResourceTable, PipelineRequest, PipelineStateCache};
use crate::shader::{ConstantBufferData, ShaderCombination, ShaderCombinationKey};
use crate::{engine_debug, engine_error, engine_info};

/// Constant buffers are placed at 256-byte granularity
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

new_key_type! {
    /// Stable key for a GpuResourceTable owned by a RenderDevice
    pub struct ResourceTableKey;
}

// ============================================================================
// Configuration and statistics
// ============================================================================

/// Render device configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Name used in logs
    pub debug_name: String,
    /// Allocators created up front
    pub initial_command_allocators: usize,
    /// Lists created up front
    pub initial_command_lists: usize,
    /// Wait for the GPU when the device is dropped
    pub flush_on_drop: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            debug_name: "Galaxy3D Device".to_string(),
            initial_command_allocators: 2,
            initial_command_lists: 2,
            flush_on_drop: true,
        }
    }
}

/// Render device statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Native allocators ever created (pool growth included)
    pub command_allocators_created: u64,
    /// Native lists ever created
    pub command_lists_created: u64,
    /// Pipelines in the cache
    pub pipelines_created: u64,
    /// Binding layouts in the cache
    pub binding_layouts_created: u64,
    pub pipeline_cache_hits: u64,
    pub pipeline_cache_misses: u64,
    pub batches_submitted: u64,
    pub last_signaled_fence: u64,
    pub last_completed_fence: u64,
}

// ============================================================================
// Pool dispatch
// ============================================================================

/// Command objects the device pools
pub trait DevicePooled: PooledObject + Sized {
    #[doc(hidden)]
    fn pool(device: &mut RenderDevice) -> &mut CommandPool<Self>;
}

impl DevicePooled for PooledCommandAllocator {
    fn pool(device: &mut RenderDevice) -> &mut CommandPool<Self> {
        &mut device.allocators
    }
}

impl DevicePooled for PooledCommandList {
    fn pool(device: &mut RenderDevice) -> &mut CommandPool<Self> {
        &mut device.lists
    }
}

// ============================================================================
// RenderDevice
// ============================================================================

pub struct RenderDevice {
    pub(crate) native: Arc<dyn NativeDevice>,
    config: DeviceConfig,
    queue: CommandQueue,
    allocators: CommandPool<PooledCommandAllocator>,
    lists: CommandPool<PooledCommandList>,
    pub(crate) pipeline_cache: PipelineStateCache,
    pub(crate) resource_tables: SlotMap<ResourceTableKey, GpuResourceTable>,
    table_lookup: FxHashMap<ShaderCombinationKey, ResourceTableKey>,
    next_allocator_id: u64,
    allocators_created: u64,
    lists_created: u64,
    batches_submitted: u64,
}

impl RenderDevice {
    /// Create the device: queue, fence and pre-warmed pools
    ///
    /// # Arguments
    ///
    /// * `native` - Native device every object is created from
    /// * `config` - Device configuration
    pub fn new(native: Arc<dyn NativeDevice>, config: DeviceConfig) -> Result<Self> {
        let queue = CommandQueue::new(native.as_ref(), &config.debug_name)?;

        let mut device = Self {
            native,
            config,
            queue,
            allocators: CommandPool::new(),
            lists: CommandPool::new(),
            pipeline_cache: PipelineStateCache::new(),
            resource_tables: SlotMap::with_key(),
            table_lookup: FxHashMap::default(),
            next_allocator_id: 0,
            allocators_created: 0,
            lists_created: 0,
            batches_submitted: 0,
        };
        device.prewarm().map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to pre-warm command pools: {}", e);
            Error::InitializationFailed(e.to_string())
        })?;

        engine_info!("galaxy3d::RenderDevice", "Created device '{}' ({} allocator(s), {} list(s) pre-warmed)",
            device.config.debug_name, device.allocators.ready_count(), device.lists.ready_count());
        Ok(device)
    }

    fn prewarm(&mut self) -> Result<()> {
        let mut allocators = Vec::with_capacity(self.config.initial_command_allocators);
        for _ in 0..self.config.initial_command_allocators {
            allocators.push(self.create_allocator()?);
        }
        if self.config.initial_command_lists > 0 && allocators.is_empty() {
            allocators.push(self.create_allocator()?);
        }
        for _ in 0..self.config.initial_command_lists {
            // Pooled lists wait closed; they are reset against their next allocator
            let mut list = self.create_list(&allocators[0], None)?;
            list.close()?;
            self.lists.push_ready(list);
        }
        for allocator in allocators {
            self.allocators.push_ready(allocator);
        }
        Ok(())
    }

    fn create_allocator(&mut self) -> Result<PooledCommandAllocator> {
        let native = self.native.create_command_allocator().map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to create command allocator: {}", e);
            e
        })?;
        let id = AllocatorId(self.next_allocator_id);
        self.next_allocator_id += 1;
        self.allocators_created += 1;
        engine_debug!("galaxy3d::RenderDevice", "Created command allocator {:?} ({} total)", id, self.allocators_created);
        Ok(PooledCommandAllocator::new(id, native))
    }

    fn create_list(&mut self, allocator: &PooledCommandAllocator, pipeline: Option<&dyn NativePipeline>) -> Result<PooledCommandList> {
        let native = self.native.create_command_list(allocator.native(), pipeline).map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to create command list: {}", e);
            e
        })?;
        self.lists_created += 1;
        engine_debug!("galaxy3d::RenderDevice", "Created command list ({} total)", self.lists_created);
        Ok(PooledCommandList::new(native, allocator.id()))
    }

    // ===== COMMAND POOLS =====

    /// Hand out an allocator that is safe to record into
    ///
    /// Reclaims allocators whose submission has completed (resetting them),
    /// then reuses a ready one or creates a new one. Never blocks.
    pub fn obtain_command_allocator(&mut self) -> Result<PooledCommandAllocator> {
        self.queue.update_execution_state(&mut self.allocators);
        self.allocators.reclaim().map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to reset command allocator: {}", e);
            e
        })?;
        match self.allocators.pop_ready() {
            Some(allocator) => Ok(allocator),
            None => self.create_allocator(),
        }
    }

    /// Hand out a list recording against `allocator`
    ///
    /// # Arguments
    ///
    /// * `allocator` - Allocator to record into (must not be protected)
    /// * `pipeline` - Initial pipeline; None for non-draw lists (clears, copies)
    ///
    /// # Panics
    ///
    /// Panics if `allocator` is protected.
    pub fn obtain_command_list(
        &mut self,
        allocator: &PooledCommandAllocator,
        pipeline: Option<&dyn NativePipeline>,
    ) -> Result<PooledCommandList> {
        assert!(
            !allocator.is_protected(),
            "command list requested against protected allocator {:?}", allocator.id()
        );
        self.queue.update_execution_state(&mut self.lists);
        self.lists.reclaim()?;
        match self.lists.pop_ready() {
            Some(mut list) => {
                list.reset(allocator, pipeline).map_err(|e| {
                    engine_error!("galaxy3d::RenderDevice", "Failed to reset command list: {}", e);
                    e
                })?;
                Ok(list)
            }
            None => self.create_list(allocator, pipeline),
        }
    }

    /// Return an allocator or list after its batch was executed
    ///
    /// The object stays protected until the queue observes the fence value
    /// it was submitted at.
    pub fn reuse_after_execution<T: DevicePooled>(&mut self, object: T) {
        T::pool(self).push_in_flight(object);
    }

    /// Return every allocator and list of an executed batch
    pub fn reuse_batch_after_execution(&mut self, batch: SubmissionBatch) {
        let (allocators, lists) = batch.into_parts();
        for allocator in allocators {
            self.allocators.push_in_flight(allocator);
        }
        for list in lists {
            self.lists.push_in_flight(list);
        }
    }

    // ===== SUBMISSION =====

    /// Execute `batch` on the queue; returns the fence value it signals
    pub fn execute(&mut self, batch: &mut SubmissionBatch) -> Result<u64> {
        let value = self.queue.execute(batch)?;
        self.batches_submitted += 1;
        Ok(value)
    }

    /// Execute `batch` and hand its objects back to the pools
    pub fn submit(&mut self, mut batch: SubmissionBatch) -> Result<u64> {
        let result = self.execute(&mut batch);
        // Executed or not, the objects go back through the in-flight set
        self.reuse_batch_after_execution(batch);
        result
    }

    /// Unprotect pooled objects whose submission has completed
    ///
    /// Returns the number of objects unprotected.
    pub fn update_execution_state(&mut self) -> usize {
        self.queue.update_execution_state(&mut self.allocators)
            + self.queue.update_execution_state(&mut self.lists)
    }

    /// Block until the GPU finishes every submitted batch
    pub fn wait_for_completion(&self) -> Result<()> {
        self.queue.wait_for_completion()
    }

    /// Wait for the GPU, then unprotect everything in flight
    pub fn flush(&mut self) -> Result<()> {
        self.queue.wait_for_completion()?;
        self.update_execution_state();
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.queue.is_completed()
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn allocator_pool(&self) -> &CommandPool<PooledCommandAllocator> {
        &self.allocators
    }

    pub fn list_pool(&self) -> &CommandPool<PooledCommandList> {
        &self.lists
    }

    // ===== PIPELINE CACHE =====

    /// Key of the resource table for `shaders`, deriving it on first use
    pub fn resource_table_for(&mut self, shaders: &ShaderCombination) -> ResourceTableKey {
        let combination = shaders.key();
        if let Some(key) = self.table_lookup.get(&combination) {
            return *key;
        }
        let table = GpuResourceTable::new(shaders);
        engine_debug!("galaxy3d::RenderDevice",
            "Derived resource table: {} heap(s), {} slot(s)", table.num_required_heaps(), table.slot_count());
        let key = self.resource_tables.insert(table);
        self.table_lookup.insert(combination, key);
        key
    }

    pub fn resource_table(&self, key: ResourceTableKey) -> Option<&GpuResourceTable> {
        self.resource_tables.get(key)
    }

    pub fn resource_table_mut(&mut self, key: ResourceTableKey) -> Option<&mut GpuResourceTable> {
        self.resource_tables.get_mut(key)
    }

    /// Native pipeline for `state` and `shaders`, built at most once per key
    pub fn get_pipeline(&mut self, state: &FixedFunctionState, shaders: &ShaderCombination) -> Result<Arc<dyn NativePipeline>> {
        let key = self.resource_table_for(shaders);
        let table = &self.resource_tables[key];
        let request = PipelineRequest::new(state, shaders, table);
        self.pipeline_cache.get_pipeline(self.native.as_ref(), &request)
    }

    /// Native binding layout for `shaders`, built at most once per layout hash
    pub fn get_binding_layout(&mut self, shaders: &ShaderCombination) -> Result<Arc<dyn NativeBindingLayout>> {
        let key = self.resource_table_for(shaders);
        let table = &self.resource_tables[key];
        self.pipeline_cache.get_binding_layout(self.native.as_ref(), table)
    }

    pub fn pipeline_cache(&self) -> &PipelineStateCache {
        &self.pipeline_cache
    }

    // ===== RESOURCES =====

    pub fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn NativeBuffer>> {
        self.native.create_buffer(desc).map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to create buffer '{}': {}", desc.debug_name, e);
            e
        })
    }

    pub fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn NativeTexture>> {
        self.native.create_texture(desc).map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to create texture '{}': {}", desc.debug_name, e);
            e
        })
    }

    pub fn create_resource_heap(&self, desc: &ResourceHeapDesc) -> Result<Arc<dyn NativeResourceHeap>> {
        self.native.create_resource_heap(desc).map_err(|e| {
            engine_error!("galaxy3d::RenderDevice", "Failed to create {:?} heap: {}", desc.heap_type, e);
            e
        })
    }

    /// Create a constant buffer sized for `data` and upload it
    pub fn create_constant_buffer(&self, data: &ConstantBufferData) -> Result<Arc<dyn NativeBuffer>> {
        let size = (data.size() as u64).max(1).div_ceil(CONSTANT_BUFFER_ALIGNMENT) * CONSTANT_BUFFER_ALIGNMENT;
        let buffer = self.create_buffer(&BufferDesc {
            size,
            usage: BufferUsage::Constant,
            debug_name: data.name().to_string(),
        })?;
        data.upload(buffer.as_ref())?;
        Ok(buffer)
    }

    // ===== ACCESSORS =====

    pub fn native(&self) -> &Arc<dyn NativeDevice> {
        &self.native
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            command_allocators_created: self.allocators_created,
            command_lists_created: self.lists_created,
            pipelines_created: self.pipeline_cache.len() as u64,
            binding_layouts_created: self.pipeline_cache.binding_layout_count() as u64,
            pipeline_cache_hits: self.pipeline_cache.hits(),
            pipeline_cache_misses: self.pipeline_cache.misses(),
            batches_submitted: self.batches_submitted,
            last_signaled_fence: self.queue.last_signaled(),
            last_completed_fence: self.queue.completed_value(),
        }
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        if !self.config.flush_on_drop || std::thread::panicking() {
            return;
        }
        if !self.queue.is_completed() {
            engine_info!("galaxy3d::RenderDevice", "'{}' waiting for fence {} before teardown",
                self.config.debug_name, self.queue.last_signaled());
        }
        if let Err(e) = self.queue.wait_for_completion() {
            engine_error!("galaxy3d::RenderDevice", "Teardown wait failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "render_device_tests.rs"]
mod tests;
