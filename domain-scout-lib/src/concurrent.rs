//! Concurrent processing utilities for domain checking.
//!
//! Two independent knobs shape a run: `batch_size` splits the SLDs into
//! sequential dispatch waves, and a [`ConcurrencyGate`] caps how many checks
//! are actually in flight at once, across waves.

use crate::error::DomainScoutError;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Per-request bound on simultaneously running checks.
///
/// Created fresh for each request and dropped with it; its capacity never
/// changes.
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Semaphore,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `capacity` holders (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot. The slot is released when the permit is dropped.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, DomainScoutError> {
        self.semaphore
            .acquire()
            .await
            .map_err(|e| DomainScoutError::internal(format!("concurrency gate closed: {}", e)))
    }
}

/// Split SLDs into dispatch waves of at most `batch_size` labels.
pub fn sld_batches(slds: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    slds.chunks(batch_size.max(1))
}

/// Number of domain checks in each dispatch wave.
pub fn wave_sizes(sld_count: usize, tld_count: usize, batch_size: usize) -> Vec<usize> {
    let batch_size = batch_size.max(1);
    (0..sld_count)
        .step_by(batch_size)
        .map(|start| (sld_count - start).min(batch_size) * tld_count)
        .collect()
}
