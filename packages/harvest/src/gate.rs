//! Bounded permit pool limiting outstanding publish work.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::error::{HarvestError, HarvestResult};

/// Counting permit pool shared by every source in a run.
///
/// Cloning shares the same pool. Permits are returned when the
/// [`GatePermit`] is dropped, on every exit path.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Scoped hold on one or more gate permits.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Largest capacity a gate can hold.
    pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

    /// Create a gate with a fixed number of permits.
    ///
    /// Capacity is clamped to `1..=MAX_CAPACITY`; a gate with no permits
    /// would never let a publish through.
    pub fn new(capacity: usize) -> Self {
        let requested = capacity;
        let capacity = capacity.clamp(1, Self::MAX_CAPACITY);
        if capacity != requested {
            warn!(requested, capacity, "Concurrency gate capacity out of range, clamped");
        }

        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait until `n` permits are free, then take them.
    pub async fn acquire(&self, n: u32) -> HarvestResult<GatePermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_many_owned(n)
            .await
            .map_err(|_| HarvestError::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Total permits the gate was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the gate; pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let gate = ConcurrencyGate::new(2);
        let permit = gate.acquire(2).await.unwrap();
        assert_eq!(gate.available(), 0);

        drop(permit);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_acquire_blocks_until_release() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire(1).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), gate.acquire(1)).await;
        assert!(blocked.is_err(), "second acquire should wait");

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire(1).await.map(|_| ()) })
        };
        drop(held);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be released")
            .unwrap()
            .unwrap();
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_released_when_task_fails() {
        let gate = ConcurrencyGate::new(1);
        let task_gate = gate.clone();

        let result = tokio::spawn(async move {
            let _permit = task_gate.acquire(1).await.unwrap();
            panic!("publish blew up");
        })
        .await;

        assert!(result.is_err());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_clamped_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.capacity(), 1);

        let permit = tokio::time::timeout(Duration::from_secs(1), gate.acquire(1)).await;
        assert!(permit.is_ok(), "a zero-sized gate must not block forever");
    }

    #[test]
    fn test_oversized_capacity_clamped() {
        let gate = ConcurrencyGate::new(usize::MAX);
        assert_eq!(gate.capacity(), ConcurrencyGate::MAX_CAPACITY);
        assert_eq!(gate.available(), ConcurrencyGate::MAX_CAPACITY);
    }

    #[tokio::test]
    async fn test_closed_gate_errors() {
        let gate = ConcurrencyGate::new(1);
        gate.close();
        assert!(matches!(gate.acquire(1).await, Err(HarvestError::GateClosed)));
    }
}
