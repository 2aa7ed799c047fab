//! Payload-free update notifications for observers.
//!
//! A notification means "state may have changed, re-read snapshots". It is
//! invoked from worker executions on any runtime thread and must never block.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Receiver of update signals.
pub trait UpdateListener: Send + Sync + 'static {
    /// Called after every worker state transition.
    fn on_update(&self);
}

impl<F> UpdateListener for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn on_update(&self) {
        self();
    }
}

/// Shared, type-erased listener.
pub type SharedListener = Arc<dyn UpdateListener>;

/// Listener that ignores every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl UpdateListener for NoopListener {
    fn on_update(&self) {}
}

/// Coalescing change feed backed by a watch channel.
///
/// Each signal bumps a generation counter. Slow observers see only the latest
/// generation; intermediate signals are dropped. Clones share the feed.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: Arc<watch::Sender<u64>>,
}

impl ChangeFeed {
    /// Create a feed at generation zero.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to generation changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("generation", &self.generation())
            .finish()
    }
}

impl UpdateListener for ChangeFeed {
    fn on_update(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}
