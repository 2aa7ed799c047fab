//! Tests for tokio spawner utilities

use prometheus_permit_pool::core::Spawn;
use prometheus_permit_pool::runtime::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
    handle.await.expect("spawned task");
}

#[test]
fn test_tokio_spawner_current_outside_runtime() {
    assert!(TokioSpawner::current().is_none());
}

#[test]
fn test_tokio_spawner_owned_runtime() {
    let spawner = TokioSpawner::with_worker_threads(Some(1)).expect("runtime");
    let (tx, rx) = std::sync::mpsc::channel();
    let handle = spawner.spawn(async move {
        tx.send("done").unwrap();
    });
    spawner.handle().block_on(handle).expect("spawned task");
    assert_eq!(rx.recv().unwrap(), "done");
}
