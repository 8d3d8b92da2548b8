/// Pooled command list

use std::sync::Arc;
use crate::error::Result;
use crate::native::{
    NativeCommandList, NativePipeline, NativeResource, NativeResourceHeap, ResourceState, TransitionBarrier,
};
use crate::command::{AllocatorId, PooledCommandAllocator, PooledObject};

/// Native command list plus the allocator it records into
///
/// Same protection rule as [`PooledCommandAllocator`]: a protected list is
/// never reset, recorded into, or handed out.
///
/// Heaps bound while recording are kept alive by the list until it is
/// recycled, which happens only after its fence value is reached.
pub struct PooledCommandList {
    native: Box<dyn NativeCommandList>,
    allocator: AllocatorId,
    recording: bool,
    protected: bool,
    submitted_fence: Option<u64>,
    retained_heaps: Vec<Arc<dyn NativeResourceHeap>>,
}

impl PooledCommandList {
    /// Wrap a freshly created native list (created in the recording state)
    pub(crate) fn new(native: Box<dyn NativeCommandList>, allocator: AllocatorId) -> Self {
        Self {
            native,
            allocator,
            recording: true,
            protected: false,
            submitted_fence: None,
            retained_heaps: Vec::new(),
        }
    }

    /// Allocator this list currently records into
    pub fn allocator_id(&self) -> AllocatorId {
        self.allocator
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn submitted_fence(&self) -> Option<u64> {
        self.submitted_fence
    }

    /// Start recording again against `allocator`
    ///
    /// # Panics
    ///
    /// Panics if the list or the allocator is protected.
    pub fn reset(
        &mut self,
        allocator: &PooledCommandAllocator,
        pipeline: Option<&dyn NativePipeline>,
    ) -> Result<()> {
        assert!(!self.protected, "command list reset while protected (fence {:?} not reached)", self.submitted_fence);
        assert!(
            !allocator.is_protected(),
            "command list reset against protected allocator {:?}", allocator.id()
        );
        if self.recording {
            // A list handed back without being executed is still open
            self.native.close()?;
            self.recording = false;
        }
        self.native.reset(allocator.native(), pipeline)?;
        self.retained_heaps.clear();
        self.allocator = allocator.id();
        self.recording = true;
        Ok(())
    }

    /// Stop recording; no-op if already closed
    pub fn close(&mut self) -> Result<()> {
        assert!(!self.protected, "command list closed while protected");
        if self.recording {
            self.native.close()?;
            self.recording = false;
        }
        Ok(())
    }

    /// Native list, for submission
    pub fn native(&self) -> &dyn NativeCommandList {
        self.native.as_ref()
    }

    /// Native list for recording
    ///
    /// # Panics
    ///
    /// Panics if the list is closed or protected.
    pub fn commands(&mut self) -> &mut dyn NativeCommandList {
        assert!(!self.protected, "recording into a protected command list");
        assert!(self.recording, "recording into a closed command list");
        self.native.as_mut()
    }

    /// Keep `heap` alive until this list is recycled
    pub fn retain_heap(&mut self, heap: &Arc<dyn NativeResourceHeap>) {
        if !self.retained_heaps.iter().any(|h| Arc::ptr_eq(h, heap)) {
            self.retained_heaps.push(heap.clone());
        }
    }

    /// Heaps referenced by the recorded commands
    pub fn retained_heaps(&self) -> &[Arc<dyn NativeResourceHeap>] {
        &self.retained_heaps
    }

    /// Record a single state transition for `resource`
    pub fn transition_barrier(&mut self, resource: &dyn NativeResource, before: ResourceState, after: ResourceState) {
        debug_assert_ne!(before, after, "no-op transition for '{}'", resource.debug_name());
        self.commands().resource_barrier(&[TransitionBarrier::new(resource, before, after)]);
    }

    /// Record several transitions at once
    pub fn resource_barriers(&mut self, barriers: &[TransitionBarrier<'_>]) {
        if barriers.is_empty() {
            return;
        }
        self.commands().resource_barrier(barriers);
    }
}

impl PooledObject for PooledCommandList {
    fn is_protected(&self) -> bool {
        self.protected
    }

    fn protect(&mut self, fence_value: u64) {
        self.protected = true;
        self.submitted_fence = Some(fence_value);
    }

    fn mark_awaiting(&mut self) {
        self.protected = true;
    }

    fn unprotect(&mut self) {
        self.protected = false;
        self.submitted_fence = None;
    }

    fn submitted_fence(&self) -> Option<u64> {
        self.submitted_fence
    }

    // Lists are reset when handed out, against the allocator chosen then
    fn recycle(&mut self) -> Result<()> {
        self.retained_heaps.clear();
        Ok(())
    }
}

impl std::fmt::Debug for PooledCommandList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledCommandList")
            .field("allocator", &self.allocator)
            .field("recording", &self.recording)
            .field("protected", &self.protected)
            .field("submitted_fence", &self.submitted_fence)
            .field("retained_heaps", &self.retained_heaps.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
