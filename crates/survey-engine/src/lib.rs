//! Stateful half of the survey planner: mission lifecycle, drone
//! assignment, and the persistence gateway.

pub mod config;
pub mod fleet;
pub mod lifecycle;
pub mod persistence;
pub mod writer;

pub use config::Config;
pub use fleet::{DroneSelector, FirstFit, FleetService, FleetStats, RELEASE_BATTERY_PENALTY};
pub use lifecycle::{MissionPlanner, PathSummary, RETENTION_KEEP_DEFAULT};
pub use persistence::{
    init_database, Database, FleetStore, InMemoryFleetStore, InMemoryMissionStore, MissionStore,
    SqliteFleetStore, SqliteMissionStore,
};
pub use writer::{spawn_writer, FailureHook, PersistHandle, WriteOp};
