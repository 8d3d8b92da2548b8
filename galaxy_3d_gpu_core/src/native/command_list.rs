/// Native command allocator and command list traits
///
/// An allocator owns the memory commands are recorded into. A list records
/// against one allocator at a time; resetting the list re-targets it. The
/// GPU reads allocator memory until the submission that used it completes,
/// so neither may be reset before then (enforced one layer up, by the pool).

use std::any::Any;
use crate::error::Result;
use crate::native::{
    NativePipeline, NativeBindingLayout, NativeResourceHeap, NativeTexture,
    GpuDescriptorHandle, TransitionBarrier, PrimitiveTopology,
    VertexBufferView, IndexBufferView,
};

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the [0, 1] depth range
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Native block of command recording memory
pub trait NativeCommandAllocator: Send {
    /// Release all recorded memory for reuse
    ///
    /// Only legal once the GPU has finished every list recorded through it.
    fn reset(&mut self) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Native command list
///
/// Recording methods mirror the native API and do not fail individually;
/// recording errors surface when the list is closed.
pub trait NativeCommandList: Send {
    /// Start recording again against `allocator`, with an optional initial pipeline
    fn reset(
        &mut self,
        allocator: &dyn NativeCommandAllocator,
        pipeline: Option<&dyn NativePipeline>,
    ) -> Result<()>;

    /// Stop recording; the list can then be executed
    fn close(&mut self) -> Result<()>;

    /// Record resource state transitions
    fn resource_barrier(&mut self, barriers: &[TransitionBarrier<'_>]);

    /// Bind a pipeline object
    fn set_pipeline(&mut self, pipeline: &dyn NativePipeline);

    /// Bind the binding layout the following binding-table writes refer to
    fn set_binding_layout(&mut self, layout: &dyn NativeBindingLayout);

    /// Bind the set of resource-view heaps (at most one per heap type)
    fn set_resource_heaps(&mut self, heaps: &[&dyn NativeResourceHeap]);

    /// Point binding-table slot `slot` at a GPU-visible heap address
    fn set_binding_table(&mut self, slot: u32, base: GpuDescriptorHandle);

    fn set_viewport(&mut self, viewport: &Viewport);

    fn set_scissor(&mut self, scissor: &Rect2D);

    /// Bind color (and optional depth) targets
    fn set_render_targets(&mut self, color: &dyn NativeTexture, depth: Option<&dyn NativeTexture>);

    fn clear_render_target(&mut self, target: &dyn NativeTexture, color: [f32; 4]);

    fn clear_depth_stencil(&mut self, target: &dyn NativeTexture, depth: f32, stencil: u8);

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    fn set_vertex_buffer(&mut self, slot: u32, view: &VertexBufferView);

    fn set_index_buffer(&mut self, view: &IndexBufferView);

    fn draw(&mut self, vertex_count: u32, first_vertex: u32);

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
