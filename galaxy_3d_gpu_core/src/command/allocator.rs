/// Pooled command allocator

use crate::error::Result;
use crate::native::NativeCommandAllocator;
use crate::command::PooledObject;

/// Identity of a pooled allocator, used as a list's back-reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocatorId(pub u64);

/// Native recording memory plus its in-flight protection
///
/// While `protected`, the GPU may still read commands recorded through
/// this allocator: it is never reset and never handed out.
pub struct PooledCommandAllocator {
    id: AllocatorId,
    native: Box<dyn NativeCommandAllocator>,
    protected: bool,
    submitted_fence: Option<u64>,
}

impl PooledCommandAllocator {
    pub(crate) fn new(id: AllocatorId, native: Box<dyn NativeCommandAllocator>) -> Self {
        Self {
            id,
            native,
            protected: false,
            submitted_fence: None,
        }
    }

    pub fn id(&self) -> AllocatorId {
        self.id
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Fence value of the submission this allocator was last part of
    pub fn submitted_fence(&self) -> Option<u64> {
        self.submitted_fence
    }

    pub fn native(&self) -> &dyn NativeCommandAllocator {
        self.native.as_ref()
    }

    /// Release all recorded memory
    ///
    /// # Panics
    ///
    /// Panics if the allocator is protected (still in flight).
    pub fn reset(&mut self) -> Result<()> {
        assert!(
            !self.protected,
            "command allocator {:?} reset while protected (fence {:?} not reached)",
            self.id, self.submitted_fence
        );
        self.native.reset()
    }
}

impl PooledObject for PooledCommandAllocator {
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

    fn recycle(&mut self) -> Result<()> {
        self.reset()
    }
}

impl std::fmt::Debug for PooledCommandAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledCommandAllocator")
            .field("id", &self.id)
            .field("protected", &self.protected)
            .field("submitted_fence", &self.submitted_fence)
            .finish()
    }
}
