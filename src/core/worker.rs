//! Worker handles, lifecycle status and active-time accounting.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::ResourceId;

/// Worker identifier.
pub type WorkerId = u32;

/// Lifecycle status of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Created, never started.
    Ready,
    /// Waiting for admission.
    Waiting,
    /// Holding the given resource.
    Holding(ResourceId),
    /// Just released its resource; cooling down.
    Released,
    /// Execution ended.
    Stopped,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Holding(id) => write!(f, "Using Resource {id}"),
            Self::Released => write!(f, "Released"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Accumulated active time plus the start of the current run.
#[derive(Debug, Default)]
struct ActiveClock {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl ActiveClock {
    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += started.elapsed();
        }
    }

    fn total(&self) -> Duration {
        self.started_at
            .map_or(self.accumulated, |started| self.accumulated + started.elapsed())
    }
}

/// Stop token and generation of the current run.
#[derive(Debug, Default)]
struct RunState {
    epoch: u64,
    stop: CancellationToken,
}

/// Proof of a started run; only the latest run may finish the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunTicket {
    pub(crate) epoch: u64,
    /// A previous run was stopped but had not exited yet.
    pub(crate) supersedes: bool,
}

#[derive(Debug)]
struct WorkerInner {
    id: WorkerId,
    status: RwLock<WorkerStatus>,
    running: AtomicBool,
    clock: Mutex<ActiveClock>,
    completed_cycles: AtomicU64,
    run: Mutex<RunState>,
}

/// Shared handle to one unit of concurrent demand.
///
/// Cloning is cheap; every clone observes the same worker.
#[derive(Debug, Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

impl Worker {
    /// Create a worker in the `Ready` state.
    #[must_use]
    pub fn new(id: WorkerId) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                id,
                status: RwLock::new(WorkerStatus::Ready),
                running: AtomicBool::new(false),
                clock: Mutex::new(ActiveClock::default()),
                completed_cycles: AtomicU64::new(0),
                run: Mutex::new(RunState::default()),
            }),
        }
    }

    /// Worker identifier.
    #[must_use]
    pub fn id(&self) -> WorkerId {
        self.inner.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> WorkerStatus {
        *self.inner.status.read()
    }

    /// Whether an execution is live for this worker.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Active time across all runs, including the current one.
    #[must_use]
    pub fn active_time(&self) -> Duration {
        self.inner.clock.lock().total()
    }

    /// Number of completed hold/release cycles.
    #[must_use]
    pub fn completed_cycles(&self) -> u64 {
        self.inner.completed_cycles.load(Ordering::Acquire)
    }

    /// Ask the current run to stop at its next wait boundary.
    pub fn request_stop(&self) {
        self.inner.run.lock().stop.cancel();
    }

    /// Point-in-time copy for observers.
    #[must_use]
    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id(),
            status: self.status(),
            running: self.is_running(),
            active_time: self.active_time(),
            completed_cycles: self.completed_cycles(),
        }
    }

    /// Mark the worker running and install the stop token for a new run.
    ///
    /// A run whose stop was requested but which has not exited yet is
    /// superseded. Returns `None` if a run is live and not stopping.
    pub(crate) fn begin_execution(&self, stop: CancellationToken) -> Option<RunTicket> {
        let mut run = self.inner.run.lock();
        let live = self.inner.running.load(Ordering::Acquire);
        if live && !run.stop.is_cancelled() {
            return None;
        }
        run.epoch += 1;
        run.stop = stop;
        self.inner.running.store(true, Ordering::Release);
        self.inner.clock.lock().start();
        Some(RunTicket {
            epoch: run.epoch,
            supersedes: live,
        })
    }

    /// Freeze active time and mark the worker stopped.
    ///
    /// Returns `false`, changing nothing, if `epoch` is not the latest run.
    pub(crate) fn finish_execution(&self, epoch: u64) -> bool {
        let run = self.inner.run.lock();
        if run.epoch != epoch {
            return false;
        }
        self.inner.clock.lock().stop();
        self.set_status(WorkerStatus::Stopped);
        self.inner.running.store(false, Ordering::Release);
        true
    }

    /// Whether both handles refer to the same worker.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set_status(&self, status: WorkerStatus) {
        *self.inner.status.write() = status;
    }

    pub(crate) fn record_cycle(&self) {
        self.inner.completed_cycles.fetch_add(1, Ordering::AcqRel);
    }
}

/// Observer view of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    /// Worker identifier.
    pub id: WorkerId,
    /// Current status.
    pub status: WorkerStatus,
    /// Whether an execution is live.
    pub running: bool,
    /// Active time across all runs.
    pub active_time: Duration,
    /// Completed hold/release cycles.
    pub completed_cycles: u64,
}
