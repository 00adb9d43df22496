//! Mission lifecycle: status transitions, flight-path regeneration, and
//! drone occupancy.
//!
//! All mutations are synchronous, serialized calls on [`MissionPlanner`];
//! the in-memory registries are the source of truth and every mutation
//! enqueues a write-behind persistence op before returning. Shared state is
//! only reachable through these entry points.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use survey_core::estimate::{estimate, FlightEstimate};
use survey_core::flight_path::{generate_waypoints, MIN_AREA_POINTS};
use survey_core::models::{
    Coordinate, Drone, DroneStatus, Mission, MissionStatus, ParameterUpdate, SurveyPattern,
};
use survey_core::PlannerError;

use crate::fleet::{FleetService, FleetStats};
use crate::persistence::{FleetStore, MissionStore};
use crate::writer::{spawn_writer, FailureHook, PersistHandle};

/// Missions kept per location by [`MissionPlanner::cleanup_old_missions`].
pub const RETENTION_KEEP_DEFAULT: usize = 20;

/// Outcome of a mutation that re-derived the flight path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSummary {
    pub waypoint_count: usize,
    pub estimate: FlightEstimate,
}

/// The mission registry and its state machine.
///
/// `pending -> assigned -> in-progress -> {completed, cancelled}`, with
/// `scheduled` and `ready` entered by explicit user action. Terminal
/// missions ignore further `cancel`/`complete` calls, so the drone release
/// and its battery penalty apply exactly once.
pub struct MissionPlanner {
    missions: HashMap<String, Mission>,
    fleet: FleetService,
    persist: PersistHandle,
}

impl MissionPlanner {
    pub fn new(missions: Vec<Mission>, fleet: FleetService, persist: PersistHandle) -> Self {
        let missions = missions.into_iter().map(|m| (m.id.clone(), m)).collect();
        Self {
            missions,
            fleet,
            persist,
        }
    }

    /// Load registries from the stores and spawn the write-behind task.
    ///
    /// Awaiting the returned handle after the planner is dropped gives a
    /// best-effort flush of queued writes.
    pub async fn bootstrap(
        mission_store: Arc<dyn MissionStore>,
        fleet_store: Arc<dyn FleetStore>,
        on_failure: Option<FailureHook>,
    ) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let missions = mission_store.list_all().await?;
        let drones = fleet_store.load().await?;
        info!(
            missions = missions.len(),
            drones = drones.len(),
            "planner state loaded"
        );
        let (persist, task) = spawn_writer(mission_store, fleet_store, on_failure);
        let planner = Self::new(missions, FleetService::new(drones), persist);
        Ok((planner, task))
    }

    /// Create a mission at `location`, binding an available drone when one
    /// exists.
    ///
    /// Initial status is `assigned` if a drone could be bound, else
    /// `pending`. The survey area starts empty with default parameters.
    pub fn create_mission(&mut self, name: &str, description: &str, location: &str) -> Mission {
        let id = Uuid::new_v4().to_string();
        let mut mission = Mission::new(
            id.clone(),
            name.to_string(),
            description.to_string(),
            location.to_string(),
        );

        if let Some(drone) = self.fleet.assign(&id, Some(location)) {
            mission.status = MissionStatus::Assigned;
            mission.drone_id = Some(drone.id);
            mission.drone_name = Some(drone.name);
            self.persist.save_fleet(self.fleet.drones());
        } else {
            debug!(location, "no available drone, mission created pending");
        }

        info!(mission_id = %id, status = ?mission.status, "mission created");
        self.persist.put_mission(&mission);
        self.missions.insert(id, mission.clone());
        mission
    }

    pub fn get(&self, id: &str) -> Result<&Mission, PlannerError> {
        self.missions
            .get(id)
            .ok_or_else(|| PlannerError::MissionNotFound(id.to_string()))
    }

    /// All missions, newest first.
    pub fn missions(&self) -> Vec<&Mission> {
        let mut all: Vec<&Mission> = self.missions.values().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub fn missions_by_location(&self, location: &str) -> Vec<&Mission> {
        self.missions()
            .into_iter()
            .filter(|m| m.location == location)
            .collect()
    }

    /// Replace the survey area wholesale and re-derive the flight path in
    /// the same transition.
    ///
    /// The polygon is stored even when it has fewer than 3 points (the
    /// user may be mid-draw); in that case the waypoints are cleared, the
    /// estimates zeroed, and `InvalidGeometry` reported so the caller can
    /// tell "path derived" from "area too small".
    pub fn update_survey_area(
        &mut self,
        id: &str,
        polygon: Vec<Coordinate>,
    ) -> Result<PathSummary, PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        mission.survey_area = polygon;
        let outcome = Self::regenerate(mission);
        self.persist.put_mission(mission);
        outcome
    }

    /// Set the coverage pattern and re-derive the flight path atomically.
    pub fn set_survey_pattern(
        &mut self,
        id: &str,
        pattern: SurveyPattern,
    ) -> Result<PathSummary, PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        mission.survey_pattern = pattern;
        let outcome = Self::regenerate(mission);
        self.persist.put_mission(mission);
        outcome
    }

    /// Merge a parameter patch and re-derive the flight path atomically.
    pub fn update_parameters(
        &mut self,
        id: &str,
        patch: &ParameterUpdate,
    ) -> Result<PathSummary, PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        patch.apply(&mut mission.parameters);
        let outcome = Self::regenerate(mission);
        self.persist.put_mission(mission);
        outcome
    }

    /// Set completion percentage, clamped to 0..=100. Does not transition
    /// status; progress ticking is caller-driven.
    pub fn update_progress(&mut self, id: &str, progress: u8) -> Result<u8, PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        mission.progress = progress.min(100);
        self.persist.put_mission(mission);
        Ok(mission.progress)
    }

    /// Mark the mission as flying.
    pub fn start(&mut self, id: &str) -> Result<(), PlannerError> {
        self.transition(id, MissionStatus::InProgress)
    }

    /// Queue the mission for future execution.
    ///
    /// Scheduling in the past is not rejected here; that guard lives in
    /// the caller.
    pub fn schedule(&mut self, id: &str, when: DateTime<Utc>) -> Result<(), PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        mission.status = MissionStatus::Scheduled;
        mission.scheduled_for = Some(when);
        info!(mission_id = id, %when, "mission scheduled");
        self.persist.put_mission(mission);
        Ok(())
    }

    /// Mark the plan as finalized but not yet flown.
    pub fn finalize(&mut self, id: &str) -> Result<(), PlannerError> {
        self.transition(id, MissionStatus::Ready)
    }

    /// Cancel the mission, releasing its drone.
    ///
    /// No-op on an already-terminal mission.
    pub fn cancel(&mut self, id: &str) -> Result<(), PlannerError> {
        self.terminate(id, MissionStatus::Cancelled)
    }

    /// Complete the mission, releasing its drone and pinning progress to
    /// 100.
    ///
    /// No-op on an already-terminal mission.
    pub fn complete(&mut self, id: &str) -> Result<(), PlannerError> {
        self.terminate(id, MissionStatus::Completed)
    }

    pub fn delete_mission(&mut self, id: &str) -> Result<(), PlannerError> {
        self.missions
            .remove(id)
            .ok_or_else(|| PlannerError::MissionNotFound(id.to_string()))?;
        self.persist.delete_mission(id);
        Ok(())
    }

    /// Drop all but the [`RETENTION_KEEP_DEFAULT`] most recently created
    /// missions for a location. Returns the number removed.
    pub fn cleanup_old_missions(&mut self, location: &str) -> usize {
        self.retention_trim(location, RETENTION_KEEP_DEFAULT)
    }

    pub fn retention_trim(&mut self, location: &str, keep: usize) -> usize {
        let mut at_location: Vec<(String, DateTime<Utc>)> = self
            .missions
            .values()
            .filter(|m| m.location == location)
            .map(|m| (m.id.clone(), m.created_at))
            .collect();
        at_location.sort_by(|a, b| b.1.cmp(&a.1));

        let stale: Vec<String> = at_location
            .into_iter()
            .skip(keep)
            .map(|(id, _)| id)
            .collect();
        for id in &stale {
            self.missions.remove(id);
        }
        if !stale.is_empty() {
            info!(location, removed = stale.len(), "old missions trimmed");
            self.persist.trim_missions(location, keep);
        }
        stale.len()
    }

    // ---- fleet passthroughs -------------------------------------------

    pub fn drone(&self, drone_id: &str) -> Result<&Drone, PlannerError> {
        self.fleet
            .drone(drone_id)
            .ok_or_else(|| PlannerError::DroneNotFound(drone_id.to_string()))
    }

    pub fn drones(&self) -> &[Drone] {
        self.fleet.drones()
    }

    pub fn fleet_stats(&self) -> FleetStats {
        self.fleet.stats()
    }

    pub fn set_drone_status(
        &mut self,
        drone_id: &str,
        status: DroneStatus,
    ) -> Result<(), PlannerError> {
        self.fleet.set_status(drone_id, status)?;
        self.persist.save_fleet(self.fleet.drones());
        Ok(())
    }

    pub fn set_drone_battery(&mut self, drone_id: &str, pct: u8) -> Result<(), PlannerError> {
        self.fleet.set_battery(drone_id, pct)?;
        self.persist.save_fleet(self.fleet.drones());
        Ok(())
    }

    // ---- internals ----------------------------------------------------

    fn transition(&mut self, id: &str, status: MissionStatus) -> Result<(), PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        mission.status = status;
        info!(mission_id = id, status = ?status, "mission status updated");
        self.persist.put_mission(mission);
        Ok(())
    }

    fn terminate(&mut self, id: &str, status: MissionStatus) -> Result<(), PlannerError> {
        let mission = Self::find_mut(&mut self.missions, id)?;
        if mission.status.is_terminal() {
            debug!(mission_id = id, status = ?mission.status, "mission already terminal");
            return Ok(());
        }

        if let Some(drone_id) = mission.drone_id.clone() {
            match self.fleet.release(&drone_id) {
                Ok(()) => self.persist.save_fleet(self.fleet.drones()),
                // The fleet never deletes drones, but a store handed us a
                // mission bound to an id we no longer know about.
                Err(err) => warn!(mission_id = id, "drone release failed: {err}"),
            }
        }

        mission.status = status;
        mission.completed_at = Some(Utc::now());
        if status == MissionStatus::Completed {
            mission.progress = 100;
        }
        info!(mission_id = id, status = ?status, "mission terminated");
        self.persist.put_mission(mission);
        Ok(())
    }

    /// Recompute waypoints and estimates from the mission's current area,
    /// pattern, and parameters. The cache fields always change together.
    fn regenerate(mission: &mut Mission) -> Result<PathSummary, PlannerError> {
        if mission.survey_area.len() < MIN_AREA_POINTS {
            mission.waypoints.clear();
            mission.estimated_distance_m = 0.0;
            mission.estimated_duration_min = 0.0;
            mission.estimated_battery_pct = 0.0;
            return Err(PlannerError::InvalidGeometry(mission.survey_area.len()));
        }

        let waypoints = generate_waypoints(
            &mission.survey_area,
            mission.survey_pattern,
            &mission.parameters,
        );
        let est = estimate(&waypoints, &mission.parameters);
        mission.waypoints = waypoints;
        mission.estimated_distance_m = est.distance_m;
        mission.estimated_duration_min = est.duration_min;
        mission.estimated_battery_pct = est.battery_pct;
        debug!(
            mission_id = %mission.id,
            waypoints = mission.waypoints.len(),
            distance_m = est.distance_m,
            "flight path regenerated"
        );
        Ok(PathSummary {
            waypoint_count: mission.waypoints.len(),
            estimate: est,
        })
    }

    fn find_mut<'a>(
        missions: &'a mut HashMap<String, Mission>,
        id: &str,
    ) -> Result<&'a mut Mission, PlannerError> {
        missions
            .get_mut(id)
            .ok_or_else(|| PlannerError::MissionNotFound(id.to_string()))
    }
}
