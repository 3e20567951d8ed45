use std::sync::{Mutex, PoisonError};

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::error::JobError;
use crate::probe::types::WorkerId;

/// Counting admission gate that also hands out a stable slot index.
///
/// Waiters are admitted in arrival order.
pub(super) struct SlotGate {
    permits: Semaphore,
    free: Mutex<Vec<usize>>,
}

impl SlotGate {
    pub(super) fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            permits: Semaphore::new(width),
            free: Mutex::new((0..width).rev().collect()),
        }
    }

    pub(super) async fn acquire(&self) -> Result<SlotPermit<'_>, JobError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| JobError::NotStarted {
                reason: err.to_string(),
            })?;
        let slot = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .ok_or_else(|| JobError::NotStarted {
                reason: "admission gate has no free slot".to_owned(),
            })?;
        Ok(SlotPermit {
            gate: self,
            slot,
            _permit: permit,
        })
    }
}

pub(super) struct SlotPermit<'gate> {
    gate: &'gate SlotGate,
    slot: usize,
    _permit: SemaphorePermit<'gate>,
}

impl SlotPermit<'_> {
    pub(super) const fn worker(&self) -> WorkerId {
        WorkerId(self.slot)
    }
}

impl Drop for SlotPermit<'_> {
    fn drop(&mut self) {
        // The slot goes back before the permit is released.
        self.gate
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.slot);
    }
}
