/// Reuse pool for fence-protected command objects
///
/// Objects move between two sets: `ready` (safe to hand out) and
/// `in_flight` (returned after execution, possibly still read by the GPU).
/// Ownership leaves the pool while an object is in use, so the same
/// object can never be handed out twice.
///
/// # Example
///
/// ```ignore
/// let mut pool = CommandPool::new();
/// pool.push_ready(allocator);
/// let allocator = pool.pop_ready().unwrap();
/// // ... record, execute at fence 1 ...
/// pool.push_in_flight(allocator);
/// pool.unprotect_completed(1, 1);  // GPU reached fence 1
/// pool.reclaim()?;                 // reset and back to ready
/// ```

use crate::error::Result;

/// A command object guarded by a fence value while the GPU uses it
pub trait PooledObject {
    fn is_protected(&self) -> bool;

    /// Mark as in flight in the submission signaled with `fence_value`
    fn protect(&mut self, fence_value: u64);

    /// Mark as awaiting a fence without a known submission value
    fn mark_awaiting(&mut self);

    /// The GPU is done with this object
    fn unprotect(&mut self);

    /// Fence value of the submission the object took part in
    fn submitted_fence(&self) -> Option<u64>;

    /// Prepare for reuse once unprotected (allocators reset their memory)
    fn recycle(&mut self) -> Result<()>;
}

pub struct CommandPool<T: PooledObject> {
    ready: Vec<T>,
    in_flight: Vec<T>,
}

impl<T: PooledObject> CommandPool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            ready: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    /// Add a new or recycled object to the ready set
    pub fn push_ready(&mut self, object: T) {
        assert!(!object.is_protected(), "protected object pushed to the ready set");
        self.ready.push(object);
    }

    /// Take an object from the ready set
    pub fn pop_ready(&mut self) -> Option<T> {
        self.ready.pop()
    }

    /// Queue an executed object until its fence is observed
    pub fn push_in_flight(&mut self, mut object: T) {
        if !object.is_protected() {
            object.mark_awaiting();
        }
        self.in_flight.push(object);
    }

    /// Unprotect in-flight objects whose submission has completed
    ///
    /// Objects with no recorded submission wait for `last_signaled`.
    /// Returns the number of objects unprotected.
    pub fn unprotect_completed(&mut self, completed_value: u64, last_signaled: u64) -> usize {
        let mut count = 0;
        for object in self.in_flight.iter_mut().filter(|o| o.is_protected()) {
            let fence = object.submitted_fence().unwrap_or(last_signaled);
            if fence <= completed_value {
                object.unprotect();
                count += 1;
            }
        }
        count
    }

    /// Recycle every unprotected in-flight object into the ready set
    ///
    /// Returns the number of objects reclaimed.
    pub fn reclaim(&mut self) -> Result<usize> {
        let mut reclaimed = 0;
        let mut index = 0;
        while index < self.in_flight.len() {
            if self.in_flight[index].is_protected() {
                index += 1;
                continue;
            }
            let mut object = self.in_flight.swap_remove(index);
            if let Err(e) = object.recycle() {
                // Keep the object owned by the pool so it is not dropped in flight
                self.in_flight.push(object);
                return Err(e);
            }
            self.ready.push(object);
            reclaimed += 1;
        }
        Ok(reclaimed)
    }

    /// Number of objects ready to be handed out
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// Number of objects awaiting a fence or reclamation
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of in-flight objects still protected
    pub fn protected_count(&self) -> usize {
        self.in_flight.iter().filter(|o| o.is_protected()).count()
    }

    /// Whether every pooled object is ready
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }
}

impl<T: PooledObject> Default for CommandPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
