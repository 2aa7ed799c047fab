//! Build a coordinator and its observer plumbing from configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context};

use crate::config::CoordinatorConfig;
use crate::core::{
    AppResult, ChangeFeed, Coordinator, CoordinatorError, InMemoryTransitionSink, Resource,
    ResourceId,
};

/// A coordinator together with the observer-side handles wired into it.
pub struct CoordinatorParts {
    /// The coordinator, running on the current tokio runtime.
    pub coordinator: Coordinator,
    /// Change feed installed as the coordinator's default listener.
    pub feed: ChangeFeed,
    /// Transition journal, if the configuration enables one.
    pub journal: Option<InMemoryTransitionSink>,
}

/// Create `capacity` free resources with ids `0..capacity`.
///
/// # Errors
///
/// Returns [`CoordinatorError::InvalidConfig`] if `capacity` does not fit a
/// resource id.
pub fn build_resources(capacity: usize) -> Result<Vec<Resource>, CoordinatorError> {
    let count = ResourceId::try_from(capacity)
        .map_err(|_| CoordinatorError::InvalidConfig(format!("capacity {capacity} too large")))?;
    Ok((0..count).map(Resource::new).collect())
}

/// Build a coordinator from configuration on the current tokio runtime.
///
/// # Errors
///
/// Returns any validation or construction error from [`Coordinator::new`].
pub fn build_coordinator(cfg: &CoordinatorConfig) -> Result<CoordinatorParts, CoordinatorError> {
    cfg.validate().map_err(CoordinatorError::InvalidConfig)?;
    let resources = build_resources(cfg.capacity)?;
    let feed = ChangeFeed::new();

    let mut coordinator = Coordinator::new(cfg.clone(), resources)?.with_listener(feed.clone());
    let journal = (cfg.transition_log_capacity > 0)
        .then(|| InMemoryTransitionSink::new(cfg.transition_log_capacity));
    if let Some(sink) = &journal {
        coordinator = coordinator.with_journal(Arc::new(sink.clone()));
    }

    Ok(CoordinatorParts {
        coordinator,
        feed,
        journal,
    })
}

/// Load configuration from `.env` and `PERMIT_POOL_*` variables, then build.
///
/// # Errors
///
/// Fails if a variable cannot be parsed, the configuration is invalid, or no
/// tokio runtime is available.
pub fn build_coordinator_from_env() -> AppResult<CoordinatorParts> {
    let cfg = CoordinatorConfig::from_env().map_err(|e| anyhow!("environment configuration: {e}"))?;
    build_coordinator(&cfg).context("building coordinator from environment")
}
