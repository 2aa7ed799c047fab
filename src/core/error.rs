//! Error types for coordinator operations.

use thiserror::Error;

use crate::core::{ResourceId, WorkerId};

/// Errors produced by coordinator components.
///
/// Worker executions never surface these; they only report status. Errors are
/// reserved for the observer-facing surface (construction and commands).
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The resource collection does not match the gate capacity.
    #[error("capacity mismatch: capacity {capacity}, resources {resources}")]
    CapacityMismatch {
        /// Configured permit count.
        capacity: usize,
        /// Number of resources supplied.
        resources: usize,
    },
    /// Two resources share an identifier.
    #[error("duplicate resource id {0}")]
    DuplicateResource(ResourceId),
    /// No tokio runtime is available to spawn worker executions on.
    #[error("no tokio runtime available")]
    NoRuntime,
    /// The coordinator has been shut down.
    #[error("coordinator has been shut down")]
    ShutDown,
    /// The worker already has a live execution.
    #[error("worker {0} is already running")]
    AlreadyRunning(WorkerId),
    /// No worker with this identifier is registered.
    #[error("unknown worker {0}")]
    UnknownWorker(WorkerId),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
