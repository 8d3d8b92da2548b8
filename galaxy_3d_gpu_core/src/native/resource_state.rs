/// GPU resource states and transition barriers
///
/// Every buffer and texture has a current state tracked by the code that
/// owns it (not by this core). Moving a resource to a new usage requires a
/// transition barrier recorded before the dependent operation. Using a
/// resource in the wrong state without a barrier is undefined behavior at
/// the native level and is not validated here.

use std::any::Any;

/// State a GPU resource can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Common state, also the state required for presentation
    Common,
    /// Destination of a copy operation
    CopyDest,
    /// Bound as a color render target
    RenderTarget,
    /// Bound as a writable depth/stencil target
    DepthWrite,
    /// Read as a vertex buffer or constant buffer
    VertexAndConstantBuffer,
    /// Read as an index buffer
    IndexBuffer,
    /// Read by a shader as a texture
    ShaderResource,
}

impl ResourceState {
    /// Presentation uses the common state
    pub const PRESENT: ResourceState = ResourceState::Common;
}

/// Any GPU resource that can be the subject of a transition barrier
pub trait NativeResource: Send + Sync {
    /// GPU virtual address of the first byte
    fn gpu_address(&self) -> u64;

    /// Name used in logs and debugger captures
    fn debug_name(&self) -> &str;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// A recorded state change for one resource
#[derive(Clone, Copy)]
pub struct TransitionBarrier<'a> {
    /// Resource changing state
    pub resource: &'a dyn NativeResource,
    /// State the resource is currently in
    pub before: ResourceState,
    /// State the resource is in once the barrier executes
    pub after: ResourceState,
}

impl<'a> TransitionBarrier<'a> {
    pub fn new(resource: &'a dyn NativeResource, before: ResourceState, after: ResourceState) -> Self {
        Self { resource, before, after }
    }
}

impl std::fmt::Debug for TransitionBarrier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionBarrier")
            .field("resource", &self.resource.debug_name())
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}
