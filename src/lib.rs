//! # Prometheus Permit Pool
//!
//! A bounded-permit resource coordinator: a fixed pool of interchangeable
//! resources shared by any number of concurrent workers, each repeatedly
//! competing for, holding, and releasing one resource.
//!
//! ## How it works
//!
//! - **Admission gate**: a counting gate with one permit per resource bounds
//!   how many workers are past the acquire step. Waits are bounded by a
//!   timeout; a timeout is a retry, not an error.
//! - **Resource assignment**: once admitted, a worker claims the first free
//!   resource in a single mutex-guarded scan-and-mark step.
//! - **Worker loop**: `Waiting → Holding → Released → Waiting → … → Stopped`,
//!   with a simulated work interval and a cooldown between cycles.
//! - **Cancellation**: global stop, per-worker stop and shutdown are all
//!   cancellation tokens observed at every wait. Permits and resource leases
//!   are RAII values, so even an aborted worker leaves the pool consistent.
//! - **Observers**: read snapshots and statistics, and receive a payload-free
//!   update signal after every transition.
//!
//! ```rust,ignore
//! use prometheus_permit_pool::builders::build_coordinator;
//! use prometheus_permit_pool::config::CoordinatorConfig;
//!
//! let parts = build_coordinator(&CoordinatorConfig::new().with_capacity(3))?;
//! let coordinator = parts.coordinator;
//! let mut changes = parts.feed.subscribe();
//!
//! for _ in 0..5 {
//!     coordinator.create_worker();
//! }
//! coordinator.start_all()?;
//!
//! while changes.changed().await.is_ok() {
//!     let snapshot = coordinator.snapshot();
//!     // render snapshot.resources / snapshot.workers
//! #   break;
//! }
//! coordinator.shutdown().await;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core coordination: admission gate, resource table, workers, coordinator.
pub mod core;
/// Configuration models and loaders.
pub mod config;
/// Builders to construct coordinators from configuration.
pub mod builders;
/// Runtime adapters and the observer API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
