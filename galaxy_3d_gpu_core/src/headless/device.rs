/// Headless device: factory for every headless object, plus test controls

use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::headless::{
    HeadlessConfig, GpuTimeline, HeadlessFence, HeadlessCommandAllocator, HeadlessCommandList,
    HeadlessCommandQueue, HeadlessBuffer, HeadlessTexture, HeadlessResourceHeap,
    HeadlessPipeline, HeadlessBindingLayout, RecordedCommand, HEADLESS_VIEW_INCREMENT,
};
use crate::native::{
    NativeDevice, NativeCommandAllocator, NativeCommandList, NativeCommandQueue, NativeFence,
    NativePipeline, NativePipelineDesc, NativeBindingLayout, BindingLayoutDesc,
    NativeResourceHeap, ResourceHeapDesc, NativeBuffer, BufferDesc, BufferUsage,
    NativeTexture, TextureDesc, TextureInfo, NativeResource, ResourceState, GpuDescriptorHandle,
};
use crate::{engine_bail, engine_debug};

/// Binding-table slots a headless binding layout accepts
pub const HEADLESS_MAX_BINDING_SLOTS: u32 = 64;

/// Native call that can be made to fail once, for error-path tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    CreateCommandAllocator,
    CreateCommandList,
    CloseCommandList,
    CreateBindingLayout,
    CreatePipeline,
    CreateResourceHeap,
    /// Reported as device removal
    ExecuteCommandLists,
}

#[derive(Default)]
pub(crate) struct HeadlessCounters {
    pub command_allocators_created: AtomicU64,
    pub command_lists_created: AtomicU64,
    pub allocator_resets: AtomicU64,
    pub pipelines_created: AtomicU64,
    pub binding_layouts_created: AtomicU64,
    pub resource_heaps_created: AtomicU64,
    pub buffers_created: AtomicU64,
    pub textures_created: AtomicU64,
    pub batches_executed: AtomicU64,
    pub barrier_mismatches: AtomicU64,
}

/// Snapshot of the headless creation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub command_allocators_created: u64,
    pub command_lists_created: u64,
    pub allocator_resets: u64,
    pub pipelines_created: u64,
    pub binding_layouts_created: u64,
    pub resource_heaps_created: u64,
    pub buffers_created: u64,
    pub textures_created: u64,
    pub batches_executed: u64,
    pub barrier_mismatches: u64,
}

/// State shared by the device and every object it created
pub(crate) struct HeadlessShared {
    pub config: HeadlessConfig,
    pub counters: HeadlessCounters,
    pub timeline: GpuTimeline,
    next_id: AtomicU64,
    next_address: AtomicU64,
    next_descriptor: AtomicU64,
    states: Mutex<FxHashMap<u64, ResourceState>>,
    submissions: Mutex<Vec<Vec<RecordedCommand>>>,
    failures: Mutex<FxHashSet<FailurePoint>>,
}

impl HeadlessShared {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Reserve `size` bytes of GPU address space (256-byte aligned)
    fn reserve_address(&self, size: u64) -> u64 {
        let aligned = size.max(1).div_ceil(256) * 256;
        self.next_address.fetch_add(aligned, Ordering::Relaxed)
    }

    fn reserve_descriptors(&self, count: u32) -> GpuDescriptorHandle {
        let bytes = count as u64 * HEADLESS_VIEW_INCREMENT as u64;
        GpuDescriptorHandle(self.next_descriptor.fetch_add(bytes, Ordering::Relaxed))
    }

    pub fn lock_states(&self) -> MutexGuard<'_, FxHashMap<u64, ResourceState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_submission(&self, lists: Vec<Vec<RecordedCommand>>) {
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(lists);
    }

    /// Consume an injected failure for `point`
    pub fn take_failure(&self, point: FailurePoint) -> bool {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&point)
    }

    fn track(&self, address: u64, state: ResourceState) {
        if self.config.validation {
            self.lock_states().insert(address, state);
        }
    }
}

fn injected(point: FailurePoint) -> Error {
    Error::BackendError(format!("injected failure at {:?}", point))
}

/// Headless device
///
/// Share it as `Arc<HeadlessDevice>`: one clone goes to the render device
/// (as `Arc<dyn NativeDevice>`), the other stays with the test to drive
/// the timeline and read counters.
pub struct HeadlessDevice {
    shared: Arc<HeadlessShared>,
}

impl HeadlessDevice {
    pub fn new(config: HeadlessConfig) -> Self {
        let timeline = GpuTimeline::new(config.completion);
        Self {
            shared: Arc::new(HeadlessShared {
                config,
                counters: HeadlessCounters::default(),
                timeline,
                next_id: AtomicU64::new(1),
                next_address: AtomicU64::new(0x1000_0000),
                next_descriptor: AtomicU64::new(0x8000_0000),
                states: Mutex::new(FxHashMap::default()),
                submissions: Mutex::new(Vec::new()),
                failures: Mutex::new(FxHashSet::default()),
            }),
        }
    }

    pub fn config(&self) -> &HeadlessConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> HeadlessStats {
        let c = &self.shared.counters;
        HeadlessStats {
            command_allocators_created: c.command_allocators_created.load(Ordering::Relaxed),
            command_lists_created: c.command_lists_created.load(Ordering::Relaxed),
            allocator_resets: c.allocator_resets.load(Ordering::Relaxed),
            pipelines_created: c.pipelines_created.load(Ordering::Relaxed),
            binding_layouts_created: c.binding_layouts_created.load(Ordering::Relaxed),
            resource_heaps_created: c.resource_heaps_created.load(Ordering::Relaxed),
            buffers_created: c.buffers_created.load(Ordering::Relaxed),
            textures_created: c.textures_created.load(Ordering::Relaxed),
            batches_executed: c.batches_executed.load(Ordering::Relaxed),
            barrier_mismatches: c.barrier_mismatches.load(Ordering::Relaxed),
        }
    }

    // ===== TIMELINE CONTROL =====

    /// Reach the oldest pending fence signal (Manual mode)
    pub fn complete_next(&self) -> Option<u64> {
        self.shared.timeline.complete_next()
    }

    /// Reach every pending fence signal (Manual mode)
    pub fn complete_all(&self) -> usize {
        self.shared.timeline.complete_all()
    }

    pub fn pending_signals(&self) -> usize {
        self.shared.timeline.pending_count()
    }

    // ===== INSPECTION =====

    /// Commands of every executed list, one entry per list, in submission order
    pub fn submitted_lists(&self) -> Vec<Vec<RecordedCommand>> {
        self.shared
            .submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Every executed command, flattened in submission order
    pub fn submitted_commands(&self) -> Vec<RecordedCommand> {
        self.submitted_lists().into_iter().flatten().collect()
    }

    pub fn clear_submitted(&self) {
        self.shared
            .submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// State validation believes `resource` is in (None when validation is off)
    pub fn tracked_state(&self, resource: &dyn NativeResource) -> Option<ResourceState> {
        self.shared.lock_states().get(&resource.gpu_address()).copied()
    }

    /// Make the next call at `point` fail
    pub fn inject_failure(&self, point: FailurePoint) {
        self.shared
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(point);
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl NativeDevice for HeadlessDevice {
    fn create_command_allocator(&self) -> Result<Box<dyn NativeCommandAllocator>> {
        if self.shared.take_failure(FailurePoint::CreateCommandAllocator) {
            return Err(injected(FailurePoint::CreateCommandAllocator));
        }
        self.shared.counters.command_allocators_created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(HeadlessCommandAllocator::new(self.shared.next_id(), self.shared.clone())))
    }

    fn create_command_list(
        &self,
        allocator: &dyn NativeCommandAllocator,
        pipeline: Option<&dyn NativePipeline>,
    ) -> Result<Box<dyn NativeCommandList>> {
        if self.shared.take_failure(FailurePoint::CreateCommandList) {
            return Err(injected(FailurePoint::CreateCommandList));
        }
        let allocator_id = match allocator.as_any().downcast_ref::<HeadlessCommandAllocator>() {
            Some(headless) => headless.id(),
            None => engine_bail!("galaxy3d::HeadlessDevice", "Allocator does not belong to the headless backend"),
        };
        self.shared.counters.command_lists_created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(HeadlessCommandList::new(allocator_id, pipeline, self.shared.clone())))
    }

    fn create_command_queue(&self) -> Result<Box<dyn NativeCommandQueue>> {
        Ok(Box::new(HeadlessCommandQueue::new(self.shared.clone())))
    }

    fn create_fence(&self, initial_value: u64) -> Result<Box<dyn NativeFence>> {
        Ok(Box::new(HeadlessFence::new(initial_value)))
    }

    fn create_binding_layout(&self, desc: &BindingLayoutDesc) -> Result<Arc<dyn NativeBindingLayout>> {
        if self.shared.take_failure(FailurePoint::CreateBindingLayout) {
            return Err(injected(FailurePoint::CreateBindingLayout));
        }
        if desc.slot_count() > HEADLESS_MAX_BINDING_SLOTS {
            engine_bail!("galaxy3d::HeadlessDevice",
                "Binding layout has {} slots (max {})", desc.slot_count(), HEADLESS_MAX_BINDING_SLOTS);
        }
        self.shared.counters.binding_layouts_created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(HeadlessBindingLayout::new(self.shared.next_id(), desc.clone())))
    }

    fn create_pipeline(&self, desc: &NativePipelineDesc<'_>) -> Result<Arc<dyn NativePipeline>> {
        if self.shared.take_failure(FailurePoint::CreatePipeline) {
            return Err(injected(FailurePoint::CreatePipeline));
        }
        if desc.shaders.vertex().is_none() {
            engine_bail!("galaxy3d::HeadlessDevice", "Graphics pipeline requires a vertex shader");
        }
        let id = self.shared.next_id();
        self.shared.counters.pipelines_created.fetch_add(1, Ordering::Relaxed);
        engine_debug!("galaxy3d::HeadlessDevice", "Created pipeline #{}", id);
        Ok(Arc::new(HeadlessPipeline {
            id,
            state_hash: desc.state.state_hash(),
            layout_hash: desc.binding_layout.desc().structural_hash(),
            shaders: desc.shaders.key(),
        }))
    }

    fn create_resource_heap(&self, desc: &ResourceHeapDesc) -> Result<Arc<dyn NativeResourceHeap>> {
        if self.shared.take_failure(FailurePoint::CreateResourceHeap) {
            return Err(injected(FailurePoint::CreateResourceHeap));
        }
        if desc.capacity == 0 {
            engine_bail!("galaxy3d::HeadlessDevice", "Resource heap capacity must be non-zero");
        }
        self.shared.counters.resource_heaps_created.fetch_add(1, Ordering::Relaxed);
        let gpu_start = self.shared.reserve_descriptors(desc.capacity);
        Ok(Arc::new(HeadlessResourceHeap::new(self.shared.next_id(), desc.heap_type, desc.capacity, gpu_start)))
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn NativeBuffer>> {
        if desc.size == 0 {
            engine_bail!("galaxy3d::HeadlessDevice", "Buffer '{}' has zero size", desc.debug_name);
        }
        let address = self.shared.reserve_address(desc.size);
        let initial = match desc.usage {
            BufferUsage::Vertex | BufferUsage::Constant => ResourceState::VertexAndConstantBuffer,
            BufferUsage::Index => ResourceState::IndexBuffer,
        };
        self.shared.track(address, initial);
        self.shared.counters.buffers_created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(HeadlessBuffer::new(address, desc.size, desc.usage, desc.debug_name.clone())))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn NativeTexture>> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("galaxy3d::HeadlessDevice",
                "Texture '{}' has invalid size {}x{}", desc.debug_name, desc.width, desc.height);
        }
        let texel_bytes = 4u64;
        let address = self.shared.reserve_address(desc.width as u64 * desc.height as u64 * texel_bytes);
        self.shared.track(address, desc.initial_state);
        self.shared.counters.textures_created.fetch_add(1, Ordering::Relaxed);
        let info = TextureInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
        };
        Ok(Arc::new(HeadlessTexture::new(address, info, desc.debug_name.clone())))
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
