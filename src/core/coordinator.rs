//! Bounded-admission coordinator and the worker execution loop.
//!
//! Every worker runs as its own tokio task looping through
//! admission → claim → work → release → cooldown. The gate bounds how many
//! workers are past admission; the resource table hands each of them a
//! distinct resource. Permits and leases are RAII values owned by the task, so
//! cancellation and abort at any suspension point leave both consistent.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::core::{
    transition_event, Admission, AdmissionGate, CoordinatorError, NoopListener, Resource,
    ResourceSnapshot, ResourceTable, SharedListener, TransitionSink, UpdateListener, Worker,
    WorkerId, WorkerSnapshot, WorkerStatus,
};
use crate::runtime::TokioSpawner;

/// Abstraction for spawning worker executions on a runtime.
pub trait Spawn {
    /// Spawn a future, returning a handle that can be awaited or aborted.
    fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Aggregate statistics for observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Pool capacity.
    pub capacity: usize,
    /// Permits free right now.
    pub permits_available: usize,
    /// Permits granted and not yet released.
    pub permits_granted: usize,
    /// Resources currently held.
    pub resources_in_use: usize,
    /// Registered workers.
    pub workers_total: usize,
    /// Workers with a live execution.
    pub workers_running: usize,
    /// Sum of active time over all workers.
    pub total_active_time: Duration,
    /// Completed hold/release cycles across all workers.
    pub completed_cycles: u64,
    /// Admission waits that timed out.
    pub admission_timeouts: u64,
    /// Claims that failed after a permit was granted.
    pub consistency_faults: u64,
    /// Global running flag.
    pub running: bool,
}

/// Full observer snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    /// Every resource in table order.
    pub resources: Vec<ResourceSnapshot>,
    /// Every registered worker in creation order.
    pub workers: Vec<WorkerSnapshot>,
    /// Aggregate statistics.
    pub stats: CoordinatorStats,
}

/// Internal counters (lock-free atomics).
#[derive(Debug, Default)]
struct CoordinatorCounters {
    completed_cycles: AtomicU64,
    admission_timeouts: AtomicU64,
    consistency_faults: AtomicU64,
}

/// Loop timings copied out of the configuration.
#[derive(Debug, Clone, Copy)]
struct Timings {
    admission_timeout: Duration,
    work_interval: Duration,
    cooldown: Duration,
    shutdown_grace: Duration,
}

/// State shared by the coordinator and every worker execution.
struct Shared {
    instance: Uuid,
    timings: Timings,
    gate: AdmissionGate,
    resources: Arc<ResourceTable>,
    running: AtomicBool,
    /// Parent of every worker stop token; cancelled on shutdown.
    root: CancellationToken,
    counters: CoordinatorCounters,
    journal: Option<Arc<dyn TransitionSink>>,
}

impl Shared {
    fn publish(&self, worker: &Worker, status: WorkerStatus, listener: &dyn UpdateListener) {
        worker.set_status(status);
        debug!(worker_id = worker.id(), status = %status, "worker transition");
        if let Some(journal) = &self.journal {
            journal.record(transition_event(worker.id(), status));
        }
        listener.on_update();
    }
}

/// Publishes `Stopped` when an execution ends, including by abort.
struct ExecutionGuard {
    shared: Arc<Shared>,
    worker: Worker,
    epoch: u64,
    listener: SharedListener,
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        if !self.worker.finish_execution(self.epoch) {
            debug!(worker_id = self.worker.id(), "superseded run exited");
            return;
        }
        debug!(
            worker_id = self.worker.id(),
            active_ms = u64::try_from(self.worker.active_time().as_millis()).unwrap_or(u64::MAX),
            "worker stopped"
        );
        if let Some(journal) = &self.shared.journal {
            journal.record(transition_event(self.worker.id(), WorkerStatus::Stopped));
        }
        self.listener.on_update();
    }
}

/// Sleep for `period` unless `cancel` fires first. Returns `true` if the full
/// period elapsed.
async fn sleep_or_cancel(period: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(period) => true,
    }
}

/// One worker's execution loop.
///
/// The guard is an argument so it is owned by the future from creation; a
/// task aborted before its first poll still publishes `Stopped`. A stopping
/// run this one replaces is joined first, so its lease and permit are gone
/// before the loop starts.
async fn execute(
    guard: ExecutionGuard,
    cancel: CancellationToken,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }
    let shared = Arc::clone(&guard.shared);
    let worker = guard.worker.clone();
    let listener = Arc::clone(&guard.listener);
    let id = worker.id();
    let timings = shared.timings;

    while shared.running.load(Ordering::Acquire) && !cancel.is_cancelled() {
        shared.publish(&worker, WorkerStatus::Waiting, listener.as_ref());

        let permit = match shared.gate.acquire(timings.admission_timeout, &cancel).await {
            Admission::Granted(permit) => permit,
            Admission::TimedOut => {
                shared
                    .counters
                    .admission_timeouts
                    .fetch_add(1, Ordering::Relaxed);
                debug!(worker_id = id, "admission timed out, retrying");
                continue;
            }
            Admission::Cancelled | Admission::Closed => break,
        };

        let Some(lease) = shared.resources.claim(id) else {
            shared
                .counters
                .consistency_faults
                .fetch_add(1, Ordering::Relaxed);
            error!(
                worker_id = id,
                capacity = shared.gate.capacity(),
                in_use = shared.resources.in_use(),
                "no free resource after admission was granted"
            );
            permit.release();
            if !sleep_or_cancel(timings.admission_timeout, &cancel).await {
                break;
            }
            continue;
        };

        shared.publish(&worker, WorkerStatus::Holding(lease.resource()), listener.as_ref());
        let finished = sleep_or_cancel(timings.work_interval, &cancel).await;
        let resource_id = lease.resource();
        lease.release();
        permit.release();
        if !finished {
            debug!(worker_id = id, resource_id, "cancelled while holding");
            break;
        }

        worker.record_cycle();
        shared
            .counters
            .completed_cycles
            .fetch_add(1, Ordering::Relaxed);
        shared.publish(&worker, WorkerStatus::Released, listener.as_ref());

        if !sleep_or_cancel(timings.cooldown, &cancel).await {
            break;
        }
    }
}

/// Coordinator owning the gate, the resource table and all worker executions.
pub struct Coordinator<S: Spawn = TokioSpawner> {
    shared: Arc<Shared>,
    spawner: S,
    workers: RwLock<Vec<Worker>>,
    executions: Mutex<Vec<(Worker, JoinHandle<()>)>>,
    listener: SharedListener,
    next_worker_id: AtomicU32,
    shut_down: AtomicBool,
}

impl Coordinator<TokioSpawner> {
    /// Create a coordinator spawning onto the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::NoRuntime`] outside a tokio runtime, and any
    /// error from [`Coordinator::with_spawner`].
    pub fn new(
        config: CoordinatorConfig,
        resources: Vec<Resource>,
    ) -> Result<Self, CoordinatorError> {
        let spawner = TokioSpawner::current().ok_or(CoordinatorError::NoRuntime)?;
        Self::with_spawner(config, resources, spawner)
    }
}

impl<S: Spawn> Coordinator<S> {
    /// Create a coordinator with an explicit spawner.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidConfig`] if the configuration is
    /// invalid, [`CoordinatorError::CapacityMismatch`] if the resource count
    /// differs from the capacity, and [`CoordinatorError::DuplicateResource`]
    /// for repeated resource ids.
    pub fn with_spawner(
        config: CoordinatorConfig,
        resources: Vec<Resource>,
        spawner: S,
    ) -> Result<Self, CoordinatorError> {
        config.validate().map_err(CoordinatorError::InvalidConfig)?;
        if resources.len() != config.capacity {
            return Err(CoordinatorError::CapacityMismatch {
                capacity: config.capacity,
                resources: resources.len(),
            });
        }
        let table = ResourceTable::new(resources)?;

        let shared = Arc::new(Shared {
            instance: Uuid::new_v4(),
            timings: Timings {
                admission_timeout: config.admission_timeout(),
                work_interval: config.work_interval(),
                cooldown: config.cooldown(),
                shutdown_grace: config.shutdown_grace(),
            },
            gate: AdmissionGate::new(config.capacity),
            resources: Arc::new(table),
            running: AtomicBool::new(false),
            root: CancellationToken::new(),
            counters: CoordinatorCounters::default(),
            journal: None,
        });

        info!(
            instance = %shared.instance,
            capacity = config.capacity,
            admission_timeout_ms = config.admission_timeout_ms,
            work_interval_ms = config.work_interval_ms,
            cooldown_ms = config.cooldown_ms,
            "coordinator initialized"
        );

        Ok(Self {
            shared,
            spawner,
            workers: RwLock::new(Vec::new()),
            executions: Mutex::new(Vec::new()),
            listener: Arc::new(NoopListener),
            next_worker_id: AtomicU32::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Attach a transition journal. Must be called before any worker runs.
    #[must_use]
    pub fn with_journal(mut self, journal: Arc<dyn TransitionSink>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.journal = Some(journal);
        } else {
            warn!("journal attached after executions started; ignored");
        }
        self
    }

    /// Set the listener used by [`start_all`](Self::start_all).
    #[must_use]
    pub fn with_listener(mut self, listener: impl UpdateListener) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    /// Coordinator instance identifier used in logs.
    #[must_use]
    pub fn instance(&self) -> Uuid {
        self.shared.instance
    }

    /// Pool capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.gate.capacity()
    }

    /// Global running flag.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Create and register a worker with the next free id.
    pub fn create_worker(&self) -> Worker {
        let mut workers = self.workers.write();
        let mut id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        while workers.iter().any(|w| w.id() == id) {
            id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        }
        let worker = Worker::new(id);
        workers.push(worker.clone());
        debug!(worker_id = id, "worker created");
        worker
    }

    /// Registered worker by id.
    #[must_use]
    pub fn worker(&self, id: WorkerId) -> Option<Worker> {
        self.workers.read().iter().find(|w| w.id() == id).cloned()
    }

    /// Set the global running flag.
    ///
    /// Clearing it is cooperative: each execution leaves its loop at the next
    /// iteration boundary.
    pub fn set_running(&self, running: bool) {
        if running && self.is_shut_down() {
            warn!(instance = %self.shared.instance, "set_running(true) after shutdown ignored");
            return;
        }
        self.shared.running.store(running, Ordering::Release);
        debug!(instance = %self.shared.instance, running, "global running flag set");
    }

    /// Schedule `worker`'s execution loop as an independent task.
    ///
    /// The worker is registered if it is not already known.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ShutDown`] after shutdown and
    /// [`CoordinatorError::AlreadyRunning`] if the worker has a live execution
    /// that has not been asked to stop.
    pub fn run(&self, worker: &Worker, listener: impl UpdateListener) -> Result<(), CoordinatorError> {
        self.run_shared(worker, Arc::new(listener))
    }

    /// Schedule `worker` with the coordinator's default listener.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn start_worker(&self, worker: &Worker) -> Result<(), CoordinatorError> {
        self.run_shared(worker, Arc::clone(&self.listener))
    }

    fn run_shared(&self, worker: &Worker, listener: SharedListener) -> Result<(), CoordinatorError> {
        if self.is_shut_down() {
            return Err(CoordinatorError::ShutDown);
        }
        let stop = self.shared.root.child_token();
        let Some(ticket) = worker.begin_execution(stop.clone()) else {
            return Err(CoordinatorError::AlreadyRunning(worker.id()));
        };
        {
            let mut workers = self.workers.write();
            if !workers.iter().any(|w| w.id() == worker.id()) {
                workers.push(worker.clone());
            }
        }

        let mut executions = self.executions.lock();
        executions.retain(|(_, handle)| !handle.is_finished());
        let previous = executions
            .iter()
            .position(|(w, _)| w.same_as(worker))
            .map(|i| executions.swap_remove(i).1);
        let guard = ExecutionGuard {
            shared: Arc::clone(&self.shared),
            worker: worker.clone(),
            epoch: ticket.epoch,
            listener,
        };
        let handle = self.spawner.spawn(execute(guard, stop, previous));
        executions.push((worker.clone(), handle));
        debug!(
            worker_id = worker.id(),
            supersedes = ticket.supersedes,
            "worker execution scheduled"
        );
        Ok(())
    }

    /// Set running and start every registered worker that is idle or stopping.
    ///
    /// A worker whose stop was requested but whose run has not exited yet is
    /// restarted; the new run waits for the old one. Returns the number of
    /// executions started.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ShutDown`] after shutdown.
    pub fn start_all(&self) -> Result<usize, CoordinatorError> {
        if self.is_shut_down() {
            return Err(CoordinatorError::ShutDown);
        }
        self.set_running(true);
        let workers = self.workers.read().clone();
        let mut started = 0;
        for worker in &workers {
            match self.run_shared(worker, Arc::clone(&self.listener)) {
                Ok(()) => started += 1,
                Err(CoordinatorError::AlreadyRunning(_)) => {}
                Err(e) => return Err(e),
            }
        }
        info!(instance = %self.shared.instance, started, "start-all");
        Ok(started)
    }

    /// Clear running and signal stop to every worker. Returns the number of
    /// workers that were running.
    pub fn stop_all(&self) -> usize {
        self.set_running(false);
        let workers = self.workers.read();
        let mut signalled = 0;
        for worker in workers.iter() {
            if worker.is_running() {
                signalled += 1;
            }
            worker.request_stop();
        }
        info!(instance = %self.shared.instance, signalled, "stop-all");
        signalled
    }

    /// Signal stop to one worker.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::UnknownWorker`] if no such worker is registered.
    pub fn stop_worker(&self, id: WorkerId) -> Result<(), CoordinatorError> {
        let worker = self.worker(id).ok_or(CoordinatorError::UnknownWorker(id))?;
        worker.request_stop();
        debug!(worker_id = id, "worker stop requested");
        Ok(())
    }

    /// Stop everything and release all concurrency resources.
    ///
    /// Each execution gets the configured grace period to finish on its own;
    /// stragglers are aborted and awaited so their leases and permits are
    /// dropped before this returns. Safe to call more than once.
    pub async fn shutdown(&self) {
        let first = !self.shut_down.swap(true, Ordering::AcqRel);
        self.shared.running.store(false, Ordering::Release);
        self.shared.root.cancel();
        self.shared.gate.close();

        let handles: Vec<(Worker, JoinHandle<()>)> = self.executions.lock().drain(..).collect();
        if first {
            info!(
                instance = %self.shared.instance,
                executions = handles.len(),
                "shutting down coordinator"
            );
        }

        let grace = self.shared.timings.shutdown_grace;
        for (worker, mut handle) in handles {
            let worker_id = worker.id();
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => debug!(worker_id, "worker execution joined"),
                Ok(Err(e)) => warn!(worker_id, error = %e, "worker execution failed"),
                Err(_) => {
                    warn!(worker_id, "worker did not stop within grace period - aborting");
                    handle.abort();
                    let _ = handle.await;
                }
            }
        }

        if first {
            info!(
                instance = %self.shared.instance,
                resources_in_use = self.shared.resources.in_use(),
                permits_granted = self.shared.gate.granted(),
                "coordinator shut down complete"
            );
        }
    }

    /// Snapshot of every resource.
    #[must_use]
    pub fn resources(&self) -> Vec<ResourceSnapshot> {
        self.shared.resources.snapshot()
    }

    /// Snapshot of every registered worker.
    #[must_use]
    pub fn workers(&self) -> Vec<WorkerSnapshot> {
        self.workers.read().iter().map(Worker::snapshot).collect()
    }

    /// Sum of active time over all workers.
    #[must_use]
    pub fn total_active_time(&self) -> Duration {
        self.workers.read().iter().map(Worker::active_time).sum()
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        let workers = self.workers.read();
        let counters = &self.shared.counters;
        CoordinatorStats {
            capacity: self.capacity(),
            permits_available: self.shared.gate.available(),
            permits_granted: self.shared.gate.granted(),
            resources_in_use: self.shared.resources.in_use(),
            workers_total: workers.len(),
            workers_running: workers.iter().filter(|w| w.is_running()).count(),
            total_active_time: workers.iter().map(Worker::active_time).sum(),
            completed_cycles: counters.completed_cycles.load(Ordering::Relaxed),
            admission_timeouts: counters.admission_timeouts.load(Ordering::Relaxed),
            consistency_faults: counters.consistency_faults.load(Ordering::Relaxed),
            running: self.is_running(),
        }
    }

    /// Resources, workers and statistics in one read.
    #[must_use]
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            resources: self.resources(),
            workers: self.workers(),
            stats: self.stats(),
        }
    }
}

impl<S: Spawn> Drop for Coordinator<S> {
    fn drop(&mut self) {
        // Signal and abort, but don't wait; explicit shutdown() is required
        // for a graceful join.
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            self.shared.running.store(false, Ordering::Release);
            self.shared.root.cancel();
            self.shared.gate.close();
            for (_, handle) in self.executions.lock().drain(..) {
                handle.abort();
            }
            debug!(instance = %self.shared.instance, "coordinator dropped without explicit shutdown");
        }
    }
}
