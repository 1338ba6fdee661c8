//! Thread-safe handle around a [`Registry`].
//!
//! Calls from different threads are serialized end to end by a reentrant
//! mutex. A call re-entering from the same thread, e.g. from an event sink
//! while a computation is in flight, is rejected with
//! [`RegistryError::ReentrantCall`] instead of deadlocking.

use std::cell::RefCell;
use std::sync::Arc;

use cvcp_core::error::RegistryError;
use cvcp_core::traits::ScoreCalculator;
use cvcp_core::types::{Address, BehavioralMetrics, CallContext, CreditScore, ScorePreview};
use cvcp_scoring::ScoringEngine;
use parking_lot::ReentrantMutex;

use crate::batch::BatchReport;
use crate::lock::ExecutionLock;
use crate::registry::Registry;

pub struct SharedRegistry<C = ScoringEngine> {
    inner: Arc<ReentrantMutex<RefCell<Registry<C>>>>,
    lock: Arc<ExecutionLock>,
}

impl<C> Clone for SharedRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            lock: Arc::clone(&self.lock),
        }
    }
}

impl<C: ScoreCalculator> SharedRegistry<C> {
    pub fn new(registry: Registry<C>) -> Self {
        let lock = Arc::clone(registry.execution_lock());
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(registry))),
            lock,
        }
    }

    /// Run `f` with exclusive access to the registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ReentrantCall`] when called from inside another call
    /// on the same thread; otherwise whatever `f` returns.
    pub fn with_mut<R>(
        &self,
        f: impl FnOnce(&mut Registry<C>) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let guard = self.inner.lock();
        if self.lock.is_entered() {
            return Err(RegistryError::ReentrantCall);
        }
        let mut registry = guard
            .try_borrow_mut()
            .map_err(|_| RegistryError::ReentrantCall)?;
        f(&mut registry)
    }

    /// Run a read-only `f` against the registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ReentrantCall`] when a mutating call is in flight on
    /// this thread.
    pub fn read<R>(&self, f: impl FnOnce(&Registry<C>) -> R) -> Result<R, RegistryError> {
        let guard = self.inner.lock();
        let registry = guard
            .try_borrow()
            .map_err(|_| RegistryError::ReentrantCall)?;
        Ok(f(&registry))
    }

    pub fn submit_metrics(
        &self,
        ctx: &CallContext,
        subject: Address,
        metrics: BehavioralMetrics,
    ) -> Result<u64, RegistryError> {
        self.with_mut(|r| r.submit_metrics(ctx, subject, metrics))
    }

    pub fn compute_score(
        &self,
        ctx: &CallContext,
        subject: Address,
    ) -> Result<CreditScore, RegistryError> {
        self.with_mut(|r| r.compute_score(ctx, subject))
    }

    pub fn batch_compute(
        &self,
        ctx: &CallContext,
        subjects: &[Address],
    ) -> Result<BatchReport, RegistryError> {
        self.with_mut(|r| r.batch_compute(ctx, subjects))
    }

    pub fn get_score(&self, subject: &Address) -> Result<CreditScore, RegistryError> {
        self.read(|r| r.get_score(subject))
    }

    pub fn get_history(&self, subject: &Address) -> Result<Vec<u64>, RegistryError> {
        self.read(|r| r.get_history(subject))
    }

    pub fn preview_score(&self, metrics: &BehavioralMetrics) -> Result<ScorePreview, RegistryError> {
        self.read(|r| r.preview_score(metrics))
    }
}
