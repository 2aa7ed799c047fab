//! Tests for error types

use prometheus_permit_pool::core::CoordinatorError;

#[test]
fn test_capacity_mismatch_error() {
    let err = CoordinatorError::CapacityMismatch {
        capacity: 3,
        resources: 2,
    };
    assert_eq!(format!("{}", err), "capacity mismatch: capacity 3, resources 2");
}

#[test]
fn test_shut_down_error() {
    let err = CoordinatorError::ShutDown;
    assert_eq!(format!("{}", err), "coordinator has been shut down");
}

#[test]
fn test_already_running_error() {
    let err = CoordinatorError::AlreadyRunning(7);
    assert_eq!(format!("{}", err), "worker 7 is already running");
}

#[test]
fn test_invalid_config_error() {
    let err = CoordinatorError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: capacity must be greater than 0"
    );
}

#[test]
fn test_app_result_wraps_coordinator_error() {
    fn fails() -> prometheus_permit_pool::core::AppResult<()> {
        Err(CoordinatorError::UnknownWorker(3))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoordinatorError>(),
        Some(CoordinatorError::UnknownWorker(3))
    ));
}
