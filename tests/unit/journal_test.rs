//! Tests for the transition journal

use prometheus_permit_pool::core::{
    transition_event, InMemoryTransitionSink, TransitionSink, WorkerStatus,
};

#[test]
fn test_in_memory_transition_sink() {
    let sink = InMemoryTransitionSink::new(10);

    sink.record(transition_event(1, WorkerStatus::Waiting));
    sink.record(transition_event(2, WorkerStatus::Waiting));
    sink.record(transition_event(1, WorkerStatus::Holding(0)));

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].worker, 1);
    assert_eq!(
        sink.statuses_of(1),
        vec![WorkerStatus::Waiting, WorkerStatus::Holding(0)]
    );
}

#[test]
fn test_transition_sink_overflow() {
    let sink = InMemoryTransitionSink::new(2);

    sink.record(transition_event(1, WorkerStatus::Waiting));
    sink.record(transition_event(1, WorkerStatus::Holding(0)));
    sink.record(transition_event(1, WorkerStatus::Released));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].status, WorkerStatus::Released);
}

#[test]
fn test_zero_capacity_sink_records_nothing() {
    let sink = InMemoryTransitionSink::new(0);
    sink.record(transition_event(1, WorkerStatus::Waiting));
    assert!(sink.events().is_empty());
}
