// Shared capacity control for in-flight remote calls

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounded worker pool shared by the status aggregator and the parallel
/// restart orchestrator.
///
/// The pool holds no tasks itself; a permit is a slot for one in-flight
/// remote call. Sequential cooldowns happen outside the pool and never
/// occupy a slot.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait for a free slot. The permit travels with the task and frees
    /// the slot when dropped.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .expect("pool semaphore is never closed")
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(4)
    }
}
