//! Transition journal.
//!
//! Bounded in-memory record of worker transitions, useful for observers that
//! want the sequence rather than the latest snapshot. Nothing is persisted.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{WorkerId, WorkerStatus};
use crate::util::clock::now_ms;

/// One worker transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    /// Worker that transitioned.
    pub worker: WorkerId,
    /// Status entered.
    pub status: WorkerStatus,
    /// Wall-clock timestamp in milliseconds.
    pub at_ms: u128,
}

/// Transition sink abstraction.
pub trait TransitionSink: Send + Sync {
    /// Record a transition.
    fn record(&self, event: TransitionEvent);
}

/// Bounded in-memory sink. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct InMemoryTransitionSink {
    events: Arc<Mutex<VecDeque<TransitionEvent>>>,
    max_events: usize,
}

impl InMemoryTransitionSink {
    /// Create a sink keeping at most `max_events` of the latest events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Statuses entered by one worker, oldest first.
    #[must_use]
    pub fn statuses_of(&self, worker: WorkerId) -> Vec<WorkerStatus> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.worker == worker)
            .map(|e| e.status)
            .collect()
    }
}

impl TransitionSink for InMemoryTransitionSink {
    fn record(&self, event: TransitionEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Build a transition event stamped with the current time.
#[must_use]
pub fn transition_event(worker: WorkerId, status: WorkerStatus) -> TransitionEvent {
    TransitionEvent {
        worker,
        status,
        at_ms: now_ms(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_is_bounded() {
        let sink = InMemoryTransitionSink::new(2);
        sink.record(transition_event(1, WorkerStatus::Waiting));
        sink.record(transition_event(1, WorkerStatus::Holding(0)));
        sink.record(transition_event(1, WorkerStatus::Released));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].status, WorkerStatus::Holding(0));
    }

    #[test]
    fn test_clones_share_buffer() {
        let sink = InMemoryTransitionSink::new(8);
        let view = sink.clone();
        sink.record(transition_event(3, WorkerStatus::Waiting));
        sink.record(transition_event(4, WorkerStatus::Waiting));
        assert_eq!(view.statuses_of(3), vec![WorkerStatus::Waiting]);
    }
}
