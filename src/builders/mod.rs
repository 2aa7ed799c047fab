//! Builders to construct coordinators from configuration.

pub mod coordinator_builder;

pub use coordinator_builder::{
    build_coordinator, build_coordinator_from_env, build_resources, CoordinatorParts,
};
