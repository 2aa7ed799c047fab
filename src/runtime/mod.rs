//! Runtime adapters and the observer API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{dispatch, health, stats_view, CommandOutcome, Health, ObserverCommand, StatsView};
pub use tokio_spawner::TokioSpawner;
