//! Counting admission gate sized to the resource pool.
//!
//! The gate bounds how many workers are simultaneously past the acquire step.
//! Permits are not tied to a particular resource, only to the pool-wide slot
//! count. Ordering between waiters is whatever the underlying tokio semaphore
//! provides (FIFO in practice), which is all the coordinator relies on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

/// Outcome of a bounded admission wait.
#[derive(Debug)]
pub enum Admission {
    /// A permit was granted and must be released exactly once.
    Granted(AdmissionPermit),
    /// The timeout elapsed before a permit became free.
    TimedOut,
    /// The caller's cancellation token fired while waiting.
    Cancelled,
    /// The gate was closed (coordinator shutdown).
    Closed,
}

/// One unit of admission capacity.
///
/// Dropping the permit returns it to the gate, so a permit is released exactly
/// once on every exit path, including task abort.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    granted: Arc<AtomicUsize>,
}

impl AdmissionPermit {
    fn new(permit: OwnedSemaphorePermit, granted: Arc<AtomicUsize>) -> Self {
        granted.fetch_add(1, Ordering::AcqRel);
        Self {
            _permit: permit,
            granted,
        }
    }

    /// Return the permit to the gate.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.granted.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Counting gate with a fixed number of permits.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    /// Permits currently handed out.
    granted: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Create a gate holding `capacity` permits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            granted: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a permit for at most `timeout`.
    ///
    /// Timeout is reported, never raised. Cancellation is checked first so a
    /// cancelled caller is not handed a permit it would immediately drop.
    pub async fn acquire(&self, timeout: Duration, cancel: &CancellationToken) -> Admission {
        let wait = tokio::time::timeout(timeout, Arc::clone(&self.semaphore).acquire_owned());
        tokio::select! {
            biased;
            () = cancel.cancelled() => Admission::Cancelled,
            res = wait => match res {
                Ok(Ok(permit)) => {
                    Admission::Granted(AdmissionPermit::new(permit, Arc::clone(&self.granted)))
                }
                Ok(Err(_)) => Admission::Closed,
                Err(_) => Admission::TimedOut,
            },
        }
    }

    /// Take a permit without waiting, if one is free.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Some(AdmissionPermit::new(permit, Arc::clone(&self.granted))),
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => None,
        }
    }

    /// Close the gate; current and future waiters observe [`Admission::Closed`].
    ///
    /// Permits already granted stay valid and are still returned on drop.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Permits free right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently granted and not yet released.
    #[must_use]
    pub fn granted(&self) -> usize {
        self.granted.load(Ordering::Acquire)
    }

    /// Total permits.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
