/// NativeDevice trait - factory for every native object the core uses

use std::sync::Arc;
use crate::error::Result;
use crate::native::{
    NativeCommandAllocator, NativeCommandList, NativeCommandQueue, NativeFence,
    NativePipeline, NativePipelineDesc, NativeBindingLayout, BindingLayoutDesc,
    NativeResourceHeap, ResourceHeapDesc, NativeBuffer, BufferDesc,
    NativeTexture, TextureDesc,
};

/// Native graphics device
///
/// Creation methods take `&self`: explicit APIs allow object creation from
/// any thread. Every failure is a fatal device/API failure for the caller.
pub trait NativeDevice: Send + Sync {
    /// Create a block of command recording memory
    fn create_command_allocator(&self) -> Result<Box<dyn NativeCommandAllocator>>;

    /// Create a command list, already recording against `allocator`
    fn create_command_list(
        &self,
        allocator: &dyn NativeCommandAllocator,
        pipeline: Option<&dyn NativePipeline>,
    ) -> Result<Box<dyn NativeCommandList>>;

    /// Create the direct (graphics) queue
    fn create_command_queue(&self) -> Result<Box<dyn NativeCommandQueue>>;

    /// Create a fence starting at `initial_value`
    fn create_fence(&self, initial_value: u64) -> Result<Box<dyn NativeFence>>;

    /// Build a binding layout from its description
    fn create_binding_layout(&self, desc: &BindingLayoutDesc) -> Result<Arc<dyn NativeBindingLayout>>;

    /// Build a pipeline object
    fn create_pipeline(&self, desc: &NativePipelineDesc<'_>) -> Result<Arc<dyn NativePipeline>>;

    /// Create a resource-view heap
    fn create_resource_heap(&self, desc: &ResourceHeapDesc) -> Result<Arc<dyn NativeResourceHeap>>;

    /// Create a CPU-writable buffer
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn NativeBuffer>>;

    /// Create a texture
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn NativeTexture>>;
}
