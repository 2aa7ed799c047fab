//! Stress tests for the coordinator on a multi-threaded runtime.
//!
//! Workers are started and stopped at seeded random moments while a sampler
//! checks pool invariants; the run must always end with a clean shutdown.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use prometheus_permit_pool::builders::build_resources;
use prometheus_permit_pool::config::CoordinatorConfig;
use prometheus_permit_pool::core::{Coordinator, Worker, WorkerStatus};

#[derive(Debug, Clone, Copy)]
enum Action {
    Spawn,
    StopOne(usize),
    StartAll,
    StopAll,
}

fn plan(seed: u64, steps: usize) -> Vec<(Action, u64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..steps)
        .map(|_| {
            let action = match rng.random_range(0..10) {
                0..=3 => Action::Spawn,
                4..=6 => Action::StopOne(rng.random_range(0..16)),
                7..=8 => Action::StartAll,
                _ => Action::StopAll,
            };
            (action, rng.random_range(1..15))
        })
        .collect()
}

fn assert_invariants(coordinator: &Coordinator, capacity: usize) {
    let snapshot = coordinator.snapshot();
    let holders: Vec<u32> = snapshot.resources.iter().filter_map(|r| r.held_by).collect();
    assert!(holders.len() <= capacity);
    let mut unique = holders.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), holders.len(), "worker holds two resources: {holders:?}");
    assert!(snapshot.stats.permits_granted <= capacity);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_random_start_stop_keeps_invariants() {
    const CAPACITY: usize = 3;
    let config = CoordinatorConfig::new()
        .with_capacity(CAPACITY)
        .with_admission_timeout_ms(20)
        .with_work_interval_ms(5)
        .with_cooldown_ms(2)
        .with_shutdown_grace_ms(1_000);
    let coordinator =
        Coordinator::new(config, build_resources(CAPACITY).expect("resources")).expect("coordinator");
    coordinator.set_running(true);

    let mut workers: Vec<Worker> = Vec::new();
    for (action, pause_ms) in plan(0x5eed, 120) {
        match action {
            Action::Spawn => {
                let worker = coordinator.create_worker();
                coordinator.start_worker(&worker).expect("start worker");
                workers.push(worker);
            }
            Action::StopOne(index) => {
                if let Some(worker) = workers.get(index) {
                    coordinator.stop_worker(worker.id()).expect("known worker");
                }
            }
            Action::StartAll => {
                coordinator.start_all().expect("start all");
            }
            Action::StopAll => {
                coordinator.stop_all();
            }
        }
        assert_invariants(&coordinator, CAPACITY);
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        assert_invariants(&coordinator, CAPACITY);
    }

    tokio::time::timeout(Duration::from_secs(10), coordinator.shutdown())
        .await
        .expect("shutdown finished");

    let stats = coordinator.stats();
    assert_eq!(stats.resources_in_use, 0);
    assert_eq!(stats.permits_granted, 0);
    assert_eq!(stats.permits_available, CAPACITY);
    for worker in &workers {
        assert_eq!(worker.status(), WorkerStatus::Stopped);
        assert!(!worker.is_running());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_workers_all_make_progress() {
    const CAPACITY: usize = 4;
    let config = CoordinatorConfig::new()
        .with_capacity(CAPACITY)
        .with_admission_timeout_ms(500)
        .with_work_interval_ms(3)
        .with_cooldown_ms(1);
    let coordinator =
        Coordinator::new(config, build_resources(CAPACITY).expect("resources")).expect("coordinator");
    let workers: Vec<Worker> = (0..16).map(|_| coordinator.create_worker()).collect();
    coordinator.start_all().expect("start all");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while workers.iter().any(|w| w.completed_cycles() < 3) {
        assert!(tokio::time::Instant::now() < deadline, "workers starved");
        assert_invariants(&coordinator, CAPACITY);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    coordinator.shutdown().await;
    let stats = coordinator.stats();
    assert_eq!(stats.resources_in_use, 0);
    assert_eq!(stats.permits_granted, 0);
    assert!(stats.completed_cycles >= 48);
}
