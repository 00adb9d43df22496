//! Persistence gateway contracts and implementations.
//!
//! The lifecycle only speaks these two traits; the in-memory registries
//! remain the source of truth and writes are layered behind them (see
//! [`crate::writer`]). Ships a DashMap-backed store for tests/previews and
//! a SQLite store for durability.

use anyhow::Result;
use async_trait::async_trait;

use survey_core::models::{Drone, Mission};

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryFleetStore, InMemoryMissionStore};
pub use sqlite::{init_database, Database, SqliteFleetStore, SqliteMissionStore};

/// Document-store contract for missions, keyed by mission id.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// Upsert by id.
    async fn put(&self, mission: &Mission) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<Mission>>;

    async fn list_all(&self) -> Result<Vec<Mission>>;

    async fn list_by_location(&self, location: &str) -> Result<Vec<Mission>>;

    /// Returns whether a record existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Delete all but the `keep` most recently created missions for a
    /// location. Returns the number of records removed.
    async fn retention_trim(&self, location: &str, keep: usize) -> Result<usize>;
}

/// Fleet store contract: whole-collection replace semantics.
#[async_trait]
pub trait FleetStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Drone>>;

    async fn save(&self, fleet: &[Drone]) -> Result<()>;
}
