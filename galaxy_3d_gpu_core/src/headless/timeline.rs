/// Simulated GPU timeline and fences

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use crate::error::{Error, Result};
use crate::headless::CompletionMode;
use crate::native::NativeFence;

/// Completed value of one fence, shared between the fence and the timeline
pub struct FenceState {
    value: Mutex<u64>,
    reached: Condvar,
}

impl FenceState {
    fn new(initial_value: u64) -> Self {
        Self {
            value: Mutex::new(initial_value),
            reached: Condvar::new(),
        }
    }

    pub fn value(&self) -> u64 {
        *self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move the completed value forward and wake every waiter
    fn advance(&self, value: u64) {
        let mut current = self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if value > *current {
            *current = value;
        }
        self.reached.notify_all();
    }

    fn wait_for(&self, value: u64) -> Result<()> {
        let mut current = self.value
            .lock()
            .map_err(|_| Error::DeviceLost("fence state poisoned".to_string()))?;
        while *current < value {
            current = self.reached
                .wait(current)
                .map_err(|_| Error::DeviceLost("fence state poisoned".to_string()))?;
        }
        Ok(())
    }
}

pub struct HeadlessFence {
    state: Arc<FenceState>,
}

impl HeadlessFence {
    pub(crate) fn new(initial_value: u64) -> Self {
        Self {
            state: Arc::new(FenceState::new(initial_value)),
        }
    }

    pub(crate) fn state(&self) -> &Arc<FenceState> {
        &self.state
    }
}

impl NativeFence for HeadlessFence {
    fn completed_value(&self) -> u64 {
        self.state.value()
    }

    fn wait_for_value(&self, value: u64) -> Result<()> {
        self.state.wait_for(value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Signals issued by queues, completed in submission order
pub struct GpuTimeline {
    mode: CompletionMode,
    pending: Mutex<VecDeque<(Arc<FenceState>, u64)>>,
}

impl GpuTimeline {
    pub fn new(mode: CompletionMode) -> Self {
        Self {
            mode,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn mode(&self) -> CompletionMode {
        self.mode
    }

    /// Queue a signal behind all earlier work
    pub(crate) fn signal(&self, fence: Arc<FenceState>, value: u64) {
        match self.mode {
            CompletionMode::Immediate => fence.advance(value),
            CompletionMode::Manual => {
                self.lock_pending().push_back((fence, value));
            }
        }
    }

    /// Complete the oldest pending signal; returns the value reached
    pub fn complete_next(&self) -> Option<u64> {
        let (fence, value) = self.lock_pending().pop_front()?;
        fence.advance(value);
        Some(value)
    }

    /// Complete every pending signal; returns how many completed
    pub fn complete_all(&self) -> usize {
        let drained: Vec<_> = self.lock_pending().drain(..).collect();
        let count = drained.len();
        for (fence, value) in drained {
            fence.advance(value);
        }
        count
    }

    /// Number of signals not reached yet
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, VecDeque<(Arc<FenceState>, u64)>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
