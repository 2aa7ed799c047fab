//! Configuration models for the coordinator.

pub mod coordinator;

pub use coordinator::{CoordinatorConfig, ENV_PREFIX};
