//! ConcurrencyLimiter - 同時実行数の上限
//!
//! A counting gate over `tokio::sync::Semaphore`. The slot is an owned permit
//! that goes back to the pool when dropped, so a runner releases it on every
//! exit path, unwinding included.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One acquired execution slot.
#[derive(Debug)]
pub struct ExecutionSlot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot. No timeout: under saturation this waits for as
    /// long as the running handlers take.
    ///
    /// Returns `None` only if the semaphore has been closed.
    pub async fn acquire(&self) -> Option<ExecutionSlot> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .ok()
            .map(|permit| ExecutionSlot { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn acquire_and_release() {
        let limiter = ConcurrencyLimiter::new(2);
        assert_eq!(limiter.capacity(), 2);

        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);

        drop(a);
        assert_eq!(limiter.available(), 1);
        drop(b);
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test]
    async fn acquire_blocks_while_saturated() {
        let limiter = ConcurrencyLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(20), limiter.acquire()).await;
        assert!(blocked.is_err());

        drop(held);
        let slot = tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(matches!(slot, Ok(Some(_))));
    }

    #[tokio::test]
    async fn slot_is_released_when_holder_panics() {
        let limiter = ConcurrencyLimiter::new(1);
        let slot = limiter.acquire().await.unwrap();

        let join = tokio::spawn(async move {
            let _slot = slot;
            panic!("boom");
        });
        assert!(join.await.unwrap_err().is_panic());
        assert_eq!(limiter.available(), 1);
    }
}
