//! Tests for builder modules

use prometheus_permit_pool::builders::{build_coordinator, build_resources};
use prometheus_permit_pool::config::CoordinatorConfig;
use prometheus_permit_pool::core::CoordinatorError;

#[test]
fn test_build_resources() {
    let resources = build_resources(3).expect("resources");
    let ids: Vec<u32> = resources.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(resources.iter().all(|r| !r.in_use() && r.held_by().is_none()));
}

#[tokio::test]
async fn test_build_coordinator_defaults() {
    let parts = build_coordinator(&CoordinatorConfig::default()).expect("coordinator");
    assert_eq!(parts.coordinator.capacity(), 3);
    assert_eq!(parts.coordinator.resources().len(), 3);
    assert!(parts.journal.is_some());
    assert_eq!(parts.feed.generation(), 0);
    parts.coordinator.shutdown().await;
}

#[tokio::test]
async fn test_build_coordinator_without_journal() {
    let cfg = CoordinatorConfig::new().with_transition_log_capacity(0);
    let parts = build_coordinator(&cfg).expect("coordinator");
    assert!(parts.journal.is_none());
    parts.coordinator.shutdown().await;
}

#[tokio::test]
async fn test_build_coordinator_invalid_config() {
    let cfg = CoordinatorConfig::new().with_capacity(0);
    let err = build_coordinator(&cfg).err().expect("invalid config");
    assert!(matches!(err, CoordinatorError::InvalidConfig(_)));
}

#[test]
fn test_build_coordinator_from_env_outside_runtime() {
    let err = prometheus_permit_pool::builders::build_coordinator_from_env()
        .err()
        .expect("no runtime");
    assert!(matches!(
        err.downcast_ref::<CoordinatorError>(),
        Some(CoordinatorError::NoRuntime)
    ));
}
