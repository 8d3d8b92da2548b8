/// Headless command allocators, lists and queue
///
/// Lists record commands as [`RecordedCommand`] values. The queue hands
/// every executed list's commands to the device so tests can inspect
/// exactly what reached the GPU, and in which order.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use crate::error::{Error, Result};
use crate::headless::device::HeadlessShared;
use crate::headless::{HeadlessFence, HeadlessPipeline, HeadlessResourceHeap, FailurePoint};
use crate::native::{
    NativeCommandAllocator, NativeCommandList, NativeCommandQueue, NativeFence,
    NativePipeline, NativeBindingLayout, NativeResourceHeap, NativeTexture,
    GpuDescriptorHandle, TransitionBarrier, ResourceState, PrimitiveTopology,
    VertexBufferView, IndexBufferView, IndexFormat, Viewport, Rect2D,
};
use crate::{engine_bail, engine_error, engine_warn};

// ============================================================================
// Recorded commands
// ============================================================================

/// One command as recorded by a headless list
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    Barrier { resource: String, address: u64, before: ResourceState, after: ResourceState },
    SetPipeline { pipeline: u64 },
    SetBindingLayout { slot_count: u32 },
    SetResourceHeaps { heaps: Vec<u64> },
    SetBindingTable { slot: u32, base: GpuDescriptorHandle },
    SetViewport(Viewport),
    SetScissor(Rect2D),
    SetRenderTargets { color: String, depth: Option<String> },
    ClearRenderTarget { target: String, color: [f32; 4] },
    ClearDepthStencil { target: String, depth: f32, stencil: u8 },
    SetPrimitiveTopology(PrimitiveTopology),
    SetVertexBuffer { slot: u32, address: u64, stride: u32 },
    SetIndexBuffer { address: u64, format: IndexFormat },
    Draw { vertex_count: u32, first_vertex: u32 },
    DrawIndexed { index_count: u32, first_index: u32, base_vertex: i32 },
}

// ============================================================================
// Command allocator
// ============================================================================

pub struct HeadlessCommandAllocator {
    id: u64,
    shared: Arc<HeadlessShared>,
}

impl HeadlessCommandAllocator {
    pub(crate) fn new(id: u64, shared: Arc<HeadlessShared>) -> Self {
        Self { id, shared }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl NativeCommandAllocator for HeadlessCommandAllocator {
    fn reset(&mut self) -> Result<()> {
        self.shared.counters.allocator_resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Command list
// ============================================================================

pub struct HeadlessCommandList {
    allocator: u64,
    shared: Arc<HeadlessShared>,
    commands: Vec<RecordedCommand>,
    closed: bool,
    recorded_while_closed: bool,
}

impl HeadlessCommandList {
    pub(crate) fn new(allocator: u64, pipeline: Option<&dyn NativePipeline>, shared: Arc<HeadlessShared>) -> Self {
        let mut list = Self {
            allocator,
            shared,
            commands: Vec::new(),
            closed: false,
            recorded_while_closed: false,
        };
        list.record_initial_pipeline(pipeline);
        list
    }

    /// Id of the allocator the list records into
    pub fn allocator_id(&self) -> u64 {
        self.allocator
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether commands were recorded after `close`
    pub fn recorded_while_closed(&self) -> bool {
        self.recorded_while_closed
    }

    fn record_initial_pipeline(&mut self, pipeline: Option<&dyn NativePipeline>) {
        if let Some(headless) = pipeline.and_then(|p| p.as_any().downcast_ref::<HeadlessPipeline>()) {
            self.commands.push(RecordedCommand::SetPipeline { pipeline: headless.id });
        }
    }

    fn push(&mut self, command: RecordedCommand) {
        if self.closed {
            self.recorded_while_closed = true;
        } else {
            self.commands.push(command);
        }
    }
}

fn allocator_id(allocator: &dyn NativeCommandAllocator) -> Result<u64> {
    match allocator.as_any().downcast_ref::<HeadlessCommandAllocator>() {
        Some(headless) => Ok(headless.id),
        None => engine_bail!("galaxy3d::HeadlessCommandList", "Allocator does not belong to the headless backend"),
    }
}

impl NativeCommandList for HeadlessCommandList {
    fn reset(&mut self, allocator: &dyn NativeCommandAllocator, pipeline: Option<&dyn NativePipeline>) -> Result<()> {
        if !self.closed {
            engine_bail!("galaxy3d::HeadlessCommandList", "Command list reset while still recording");
        }
        self.allocator = allocator_id(allocator)?;
        self.commands.clear();
        self.closed = false;
        self.recorded_while_closed = false;
        self.record_initial_pipeline(pipeline);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            engine_bail!("galaxy3d::HeadlessCommandList", "Command list closed twice");
        }
        if self.shared.take_failure(FailurePoint::CloseCommandList) {
            engine_bail!("galaxy3d::HeadlessCommandList", "Injected failure at {:?}", FailurePoint::CloseCommandList);
        }
        self.closed = true;
        Ok(())
    }

    fn resource_barrier(&mut self, barriers: &[TransitionBarrier<'_>]) {
        for barrier in barriers {
            self.push(RecordedCommand::Barrier {
                resource: barrier.resource.debug_name().to_string(),
                address: barrier.resource.gpu_address(),
                before: barrier.before,
                after: barrier.after,
            });
        }
    }

    fn set_pipeline(&mut self, pipeline: &dyn NativePipeline) {
        let id = pipeline.as_any().downcast_ref::<HeadlessPipeline>().map(|p| p.id).unwrap_or(0);
        self.push(RecordedCommand::SetPipeline { pipeline: id });
    }

    fn set_binding_layout(&mut self, layout: &dyn NativeBindingLayout) {
        self.push(RecordedCommand::SetBindingLayout { slot_count: layout.desc().slot_count() });
    }

    fn set_resource_heaps(&mut self, heaps: &[&dyn NativeResourceHeap]) {
        let ids = heaps
            .iter()
            .map(|h| h.as_any().downcast_ref::<HeadlessResourceHeap>().map(|h| h.id()).unwrap_or(0))
            .collect();
        self.push(RecordedCommand::SetResourceHeaps { heaps: ids });
    }

    fn set_binding_table(&mut self, slot: u32, base: GpuDescriptorHandle) {
        self.push(RecordedCommand::SetBindingTable { slot, base });
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.push(RecordedCommand::SetViewport(*viewport));
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        self.push(RecordedCommand::SetScissor(*scissor));
    }

    fn set_render_targets(&mut self, color: &dyn NativeTexture, depth: Option<&dyn NativeTexture>) {
        self.push(RecordedCommand::SetRenderTargets {
            color: color.as_resource().debug_name().to_string(),
            depth: depth.map(|d| d.as_resource().debug_name().to_string()),
        });
    }

    fn clear_render_target(&mut self, target: &dyn NativeTexture, color: [f32; 4]) {
        self.push(RecordedCommand::ClearRenderTarget {
            target: target.as_resource().debug_name().to_string(),
            color,
        });
    }

    fn clear_depth_stencil(&mut self, target: &dyn NativeTexture, depth: f32, stencil: u8) {
        self.push(RecordedCommand::ClearDepthStencil {
            target: target.as_resource().debug_name().to_string(),
            depth,
            stencil,
        });
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.push(RecordedCommand::SetPrimitiveTopology(topology));
    }

    fn set_vertex_buffer(&mut self, slot: u32, view: &VertexBufferView) {
        self.push(RecordedCommand::SetVertexBuffer {
            slot,
            address: view.buffer.as_resource().gpu_address() + view.offset,
            stride: view.stride,
        });
    }

    fn set_index_buffer(&mut self, view: &IndexBufferView) {
        self.push(RecordedCommand::SetIndexBuffer {
            address: view.buffer.as_resource().gpu_address() + view.offset,
            format: view.format,
        });
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.push(RecordedCommand::Draw { vertex_count, first_vertex });
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.push(RecordedCommand::DrawIndexed { index_count, first_index, base_vertex });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Command queue
// ============================================================================

pub struct HeadlessCommandQueue {
    shared: Arc<HeadlessShared>,
}

impl HeadlessCommandQueue {
    pub(crate) fn new(shared: Arc<HeadlessShared>) -> Self {
        Self { shared }
    }

    /// Check every barrier against the tracked state and apply it
    fn validate_barriers(&self, commands: &[RecordedCommand]) {
        let mut states = self.shared.lock_states();
        for command in commands {
            if let RecordedCommand::Barrier { resource, address, before, after } = command {
                if let Some(current) = states.get(address) {
                    if current != before {
                        self.shared.counters.barrier_mismatches.fetch_add(1, Ordering::Relaxed);
                        engine_warn!("galaxy3d::HeadlessValidation",
                            "Barrier on '{}' expects {:?} but the resource is in {:?}",
                            resource, before, current);
                    }
                }
                states.insert(*address, *after);
            }
        }
    }
}

impl NativeCommandQueue for HeadlessCommandQueue {
    fn execute_command_lists(&mut self, lists: &[&dyn NativeCommandList]) -> Result<()> {
        if self.shared.take_failure(FailurePoint::ExecuteCommandLists) {
            engine_error!("galaxy3d::HeadlessCommandQueue", "Injected device removal");
            return Err(Error::DeviceLost("injected device removal".to_string()));
        }

        let mut batch = Vec::with_capacity(lists.len());
        for list in lists {
            let headless = match list.as_any().downcast_ref::<HeadlessCommandList>() {
                Some(headless) => headless,
                None => engine_bail!("galaxy3d::HeadlessCommandQueue", "Command list does not belong to the headless backend"),
            };
            if !headless.is_closed() {
                engine_bail!("galaxy3d::HeadlessCommandQueue", "Executing a command list that is still recording");
            }
            if headless.recorded_while_closed() {
                engine_bail!("galaxy3d::HeadlessCommandQueue", "Executing a command list that was recorded into after close");
            }
            batch.push(headless.commands().to_vec());
        }

        if self.shared.config.validation {
            for commands in &batch {
                self.validate_barriers(commands);
            }
        }

        self.shared.counters.batches_executed.fetch_add(1, Ordering::Relaxed);
        self.shared.record_submission(batch);
        Ok(())
    }

    fn signal(&mut self, fence: &dyn NativeFence, value: u64) -> Result<()> {
        match fence.as_any().downcast_ref::<HeadlessFence>() {
            Some(headless) => {
                self.shared.timeline.signal(headless.state().clone(), value);
                Ok(())
            }
            None => engine_bail!("galaxy3d::HeadlessCommandQueue", "Fence does not belong to the headless backend"),
        }
    }
}
