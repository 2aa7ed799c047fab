//! Tests for utility functions

use std::time::Duration;

use prometheus_permit_pool::util::{format_elapsed, now_ms};

#[test]
fn test_format_elapsed_millis() {
    assert_eq!(format_elapsed(Duration::from_millis(7)), "00:00.007");
}

#[test]
fn test_format_elapsed_minutes() {
    assert_eq!(format_elapsed(Duration::from_millis(125_500)), "02:05.500");
}

#[test]
fn test_now_ms_non_decreasing() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    prometheus_permit_pool::util::init_tracing();
    prometheus_permit_pool::util::init_tracing_with("debug");
    tracing::info!("tracing initialized twice");
}
