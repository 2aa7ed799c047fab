//! Observer-facing commands and views.
//!
//! A presentation layer drives the coordinator through [`ObserverCommand`] and
//! renders [`StatsView`]; both are plain serde types so they can cross any
//! boundary the observer lives behind.

use serde::{Deserialize, Serialize};

use crate::core::{Coordinator, CoordinatorError, CoordinatorStats, Spawn, WorkerId};
use crate::util::clock::format_elapsed;

/// Commands an observer may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum ObserverCommand {
    /// Register a new worker.
    CreateWorker,
    /// Create a worker and start it immediately if the coordinator is running.
    SpawnWorker,
    /// Set running and start every idle worker.
    StartAll,
    /// Clear running and signal every worker to stop.
    StopAll,
    /// Signal one worker to stop.
    StopWorker {
        /// Target worker.
        id: WorkerId,
    },
    /// Terminal shutdown.
    Shutdown,
}

/// Result of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CommandOutcome {
    /// A worker was created (and started, if requested and running).
    WorkerCreated {
        /// New worker id.
        id: WorkerId,
        /// Whether an execution was started for it.
        started: bool,
    },
    /// Start-all completed.
    Started {
        /// Executions started.
        count: usize,
    },
    /// Stop signalled.
    StopSignalled {
        /// Workers that were running.
        count: usize,
    },
    /// Coordinator shut down.
    ShutDown,
}

/// Aggregate statistics formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsView {
    /// Header line naming the permit count.
    pub title: String,
    /// Total execution time rendered as `mm:ss.SSS`.
    pub total_execution_time: String,
    /// Raw statistics.
    pub stats: CoordinatorStats,
}

/// Health response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Coordinator running flag.
    pub running: bool,
}

/// Apply an observer command.
///
/// # Errors
///
/// Returns [`CoordinatorError::ShutDown`] for commands issued after shutdown
/// (other than `Shutdown` itself) and [`CoordinatorError::UnknownWorker`] for
/// a stop aimed at an unregistered worker.
pub async fn dispatch<S: Spawn>(
    coordinator: &Coordinator<S>,
    command: ObserverCommand,
) -> Result<CommandOutcome, CoordinatorError> {
    if coordinator.is_shut_down() && command != ObserverCommand::Shutdown {
        tracing::warn!(?command, "command rejected after shutdown");
        return Err(CoordinatorError::ShutDown);
    }
    match command {
        ObserverCommand::CreateWorker => {
            let worker = coordinator.create_worker();
            Ok(CommandOutcome::WorkerCreated {
                id: worker.id(),
                started: false,
            })
        }
        ObserverCommand::SpawnWorker => {
            let worker = coordinator.create_worker();
            let started = if coordinator.is_running() {
                coordinator.start_worker(&worker)?;
                true
            } else {
                false
            };
            Ok(CommandOutcome::WorkerCreated {
                id: worker.id(),
                started,
            })
        }
        ObserverCommand::StartAll => Ok(CommandOutcome::Started {
            count: coordinator.start_all()?,
        }),
        ObserverCommand::StopAll => Ok(CommandOutcome::StopSignalled {
            count: coordinator.stop_all(),
        }),
        ObserverCommand::StopWorker { id } => {
            let was_running = coordinator.worker(id).is_some_and(|w| w.is_running());
            coordinator.stop_worker(id)?;
            Ok(CommandOutcome::StopSignalled {
                count: usize::from(was_running),
            })
        }
        ObserverCommand::Shutdown => {
            coordinator.shutdown().await;
            Ok(CommandOutcome::ShutDown)
        }
    }
}

/// Format coordinator statistics for display.
#[must_use]
pub fn stats_view<S: Spawn>(coordinator: &Coordinator<S>) -> StatsView {
    let stats = coordinator.stats();
    StatsView {
        title: format!("Resources (Semaphore permits: {})", stats.capacity),
        total_execution_time: format_elapsed(stats.total_active_time),
        stats,
    }
}

/// Return a health payload.
#[must_use]
pub fn health<S: Spawn>(coordinator: &Coordinator<S>) -> Health {
    Health {
        ok: !coordinator.is_shut_down(),
        running: coordinator.is_running(),
    }
}
