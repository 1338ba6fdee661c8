//! Non-reentrant execution marker.
//!
//! A mutating call enters the lock for its whole duration, including event
//! delivery. Any attempt to enter again before the guard drops fails with
//! [`RegistryError::ReentrantCall`]. The flag is cleared on drop, so early
//! returns and panics release it too.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cvcp_core::error::RegistryError;

#[derive(Debug, Default)]
pub struct ExecutionLock {
    entered: AtomicBool,
}

impl ExecutionLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a call in progress.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ReentrantCall`] if a call is already in progress.
    pub fn enter(lock: &Arc<Self>) -> Result<ExecutionGuard, RegistryError> {
        lock.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RegistryError::ReentrantCall)?;
        Ok(ExecutionGuard {
            lock: Arc::clone(lock),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Clears the in-progress flag on drop.
#[derive(Debug)]
pub struct ExecutionGuard {
    lock: Arc<ExecutionLock>,
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        self.lock.entered.store(false, Ordering::Release);
    }
}
