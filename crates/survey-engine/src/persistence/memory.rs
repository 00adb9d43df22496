//! In-memory store implementations backed by DashMap.
//!
//! Used by tests and by planner sessions that opt out of durability.

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;

use survey_core::models::{Drone, Mission};

use super::{FleetStore, MissionStore};

#[derive(Default)]
pub struct InMemoryMissionStore {
    missions: DashMap<String, Mission>,
}

impl InMemoryMissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }
}

#[async_trait]
impl MissionStore for InMemoryMissionStore {
    async fn put(&self, mission: &Mission) -> Result<()> {
        self.missions.insert(mission.id.clone(), mission.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Mission>> {
        Ok(self.missions.get(id).map(|r| r.value().clone()))
    }

    async fn list_all(&self) -> Result<Vec<Mission>> {
        Ok(self.missions.iter().map(|r| r.value().clone()).collect())
    }

    async fn list_by_location(&self, location: &str) -> Result<Vec<Mission>> {
        Ok(self
            .missions
            .iter()
            .filter(|r| r.value().location == location)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.missions.remove(id).is_some())
    }

    async fn retention_trim(&self, location: &str, keep: usize) -> Result<usize> {
        let mut at_location: Vec<(String, chrono::DateTime<chrono::Utc>)> = self
            .missions
            .iter()
            .filter(|r| r.value().location == location)
            .map(|r| (r.key().clone(), r.value().created_at))
            .collect();
        at_location.sort_by(|a, b| b.1.cmp(&a.1));

        let mut removed = 0;
        for (id, _) in at_location.into_iter().skip(keep) {
            if self.missions.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Whole-collection snapshot store for the fleet.
#[derive(Default)]
pub struct InMemoryFleetStore {
    fleet: Mutex<Vec<Drone>>,
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(fleet: Vec<Drone>) -> Self {
        Self {
            fleet: Mutex::new(fleet),
        }
    }
}

#[async_trait]
impl FleetStore for InMemoryFleetStore {
    async fn load(&self) -> Result<Vec<Drone>> {
        Ok(self.fleet.lock().expect("fleet lock poisoned").clone())
    }

    async fn save(&self, fleet: &[Drone]) -> Result<()> {
        *self.fleet.lock().expect("fleet lock poisoned") = fleet.to_vec();
        Ok(())
    }
}
