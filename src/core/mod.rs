//! Core coordination abstractions: admission, resource assignment, workers.

pub mod admission;
pub mod coordinator;
pub mod error;
pub mod journal;
pub mod notify;
pub mod resource;
pub mod worker;

pub use admission::{Admission, AdmissionGate, AdmissionPermit};
pub use coordinator::{Coordinator, CoordinatorSnapshot, CoordinatorStats, Spawn};
pub use error::{AppResult, CoordinatorError};
pub use journal::{transition_event, InMemoryTransitionSink, TransitionEvent, TransitionSink};
pub use notify::{ChangeFeed, NoopListener, SharedListener, UpdateListener};
pub use resource::{Resource, ResourceId, ResourceLease, ResourceSnapshot, ResourceTable};
pub use worker::{Worker, WorkerId, WorkerSnapshot, WorkerStatus};
