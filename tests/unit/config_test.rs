//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use prometheus_permit_pool::config::CoordinatorConfig;

#[test]
fn test_default_config_is_valid() {
    let config = CoordinatorConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.capacity, 3);
    assert_eq!(config.admission_timeout(), Duration::from_secs(1));
    assert_eq!(config.work_interval(), Duration::from_secs(2));
    assert_eq!(config.cooldown(), Duration::from_secs(1));
}

#[test]
fn test_config_invalid_capacity() {
    let config = CoordinatorConfig::new().with_capacity(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_config_invalid_admission_timeout() {
    let config = CoordinatorConfig::new().with_admission_timeout_ms(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_config_invalid_work_interval() {
    let config = CoordinatorConfig::new().with_work_interval_ms(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_config_zero_cooldown_allowed() {
    let config = CoordinatorConfig::new().with_cooldown_ms(0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "capacity": 5,
        "admission_timeout_ms": 250,
        "work_interval_ms": 500
    }"#;

    let config = CoordinatorConfig::from_json_str(json).expect("valid json");
    assert_eq!(config.capacity, 5);
    assert_eq!(config.admission_timeout_ms, 250);
    assert_eq!(config.work_interval_ms, 500);
    // Unspecified fields fall back to defaults.
    assert_eq!(config.cooldown_ms, 1_000);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(CoordinatorConfig::from_json_str(r#"{ "capacity": 0 }"#).is_err());
    assert!(CoordinatorConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("PERMIT_POOL_CAPACITY", "4"),
        ("PERMIT_POOL_COOLDOWN_MS", " 50 "),
    ]
    .into_iter()
    .collect();

    let config = CoordinatorConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
        .expect("valid lookup");
    assert_eq!(config.capacity, 4);
    assert_eq!(config.cooldown_ms, 50);
    assert_eq!(config.work_interval_ms, 2_000);
}

#[test]
fn test_config_from_lookup_bad_value() {
    let err = CoordinatorConfig::from_lookup(|key| {
        (key == "PERMIT_POOL_WORK_INTERVAL_MS").then(|| "soon".to_string())
    })
    .unwrap_err();
    assert!(err.contains("PERMIT_POOL_WORK_INTERVAL_MS"));
}
