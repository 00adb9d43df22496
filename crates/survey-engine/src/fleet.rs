//! Drone assignment service.
//!
//! Owns the in-memory fleet registry. A drone is `in-mission` for at most
//! one mission at any time; `assign` never hands out a drone that is
//! already bound.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use survey_core::models::{Drone, DroneStatus};
use survey_core::PlannerError;

/// Battery percentage deducted when a drone is released, modelling
/// post-flight drain.
pub const RELEASE_BATTERY_PENALTY: u8 = 10;

/// Pluggable drone selection policy.
///
/// Returns the index into `fleet` of the drone to bind, or `None` if the
/// fleet has no acceptable candidate. Implementations must only pick
/// drones that are `available`.
pub trait DroneSelector: Send + Sync {
    fn select(&self, fleet: &[Drone], location: Option<&str>) -> Option<usize>;
}

/// First drone that is `available` in fleet enumeration order, optionally
/// filtered by location. A simplistic first-fit policy, not an optimizer:
/// no battery ranking, no distance ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl DroneSelector for FirstFit {
    fn select(&self, fleet: &[Drone], location: Option<&str>) -> Option<usize> {
        fleet.iter().position(|drone| {
            drone.status == DroneStatus::Available
                && location.is_none_or(|loc| drone.location == loc)
        })
    }
}

/// Counts of drones per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total: usize,
    pub available: usize,
    pub in_mission: usize,
    pub maintenance: usize,
    pub charging: usize,
}

pub struct FleetService {
    drones: Vec<Drone>,
    selector: Box<dyn DroneSelector>,
}

impl FleetService {
    /// Build the service over a provisioned fleet with first-fit selection.
    pub fn new(drones: Vec<Drone>) -> Self {
        Self::with_selector(drones, Box::new(FirstFit))
    }

    pub fn with_selector(drones: Vec<Drone>, selector: Box<dyn DroneSelector>) -> Self {
        Self { drones, selector }
    }

    /// Bind an available drone to `mission_id`.
    ///
    /// Returns `None` when no drone qualifies; that is a valid non-error
    /// outcome the caller must check, not a failure.
    pub fn assign(&mut self, mission_id: &str, location: Option<&str>) -> Option<Drone> {
        let idx = self.selector.select(&self.drones, location)?;
        let drone = &mut self.drones[idx];
        // The selector contract says "available only"; re-check so a buggy
        // selector cannot double-book a drone.
        if drone.status != DroneStatus::Available || drone.current_mission_id.is_some() {
            debug!(drone_id = %drone.id, "selector returned a non-available drone, refusing");
            return None;
        }

        drone.status = DroneStatus::InMission;
        drone.last_mission = Some(Utc::now());
        drone.total_flights += 1;
        drone.current_mission_id = Some(mission_id.to_string());
        info!(drone_id = %drone.id, mission_id, "drone assigned");
        Some(drone.clone())
    }

    /// Release a drone back to the pool, clearing its mission binding and
    /// applying the post-flight battery penalty (floored at 0).
    pub fn release(&mut self, drone_id: &str) -> Result<(), PlannerError> {
        let drone = self
            .drones
            .iter_mut()
            .find(|d| d.id == drone_id)
            .ok_or_else(|| PlannerError::DroneNotFound(drone_id.to_string()))?;

        drone.status = DroneStatus::Available;
        drone.current_mission_id = None;
        drone.battery_pct = drone.battery_pct.saturating_sub(RELEASE_BATTERY_PENALTY);
        info!(drone_id, battery_pct = drone.battery_pct, "drone released");
        Ok(())
    }

    pub fn set_status(&mut self, drone_id: &str, status: DroneStatus) -> Result<(), PlannerError> {
        let drone = self.find_mut(drone_id)?;
        drone.status = status;
        Ok(())
    }

    pub fn set_battery(&mut self, drone_id: &str, battery_pct: u8) -> Result<(), PlannerError> {
        let drone = self.find_mut(drone_id)?;
        drone.battery_pct = battery_pct.min(100);
        Ok(())
    }

    pub fn drone(&self, drone_id: &str) -> Option<&Drone> {
        self.drones.iter().find(|d| d.id == drone_id)
    }

    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    pub fn stats(&self) -> FleetStats {
        let count = |status| self.drones.iter().filter(|d| d.status == status).count();
        FleetStats {
            total: self.drones.len(),
            available: count(DroneStatus::Available),
            in_mission: count(DroneStatus::InMission),
            maintenance: count(DroneStatus::Maintenance),
            charging: count(DroneStatus::Charging),
        }
    }

    fn find_mut(&mut self, drone_id: &str) -> Result<&mut Drone, PlannerError> {
        self.drones
            .iter_mut()
            .find(|d| d.id == drone_id)
            .ok_or_else(|| PlannerError::DroneNotFound(drone_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone(id: &str, location: &str, battery: u8) -> Drone {
        Drone {
            id: id.to_string(),
            name: format!("Drone {id}"),
            model: "Test Quad".to_string(),
            status: DroneStatus::Available,
            battery_pct: battery,
            location: location.to_string(),
            total_flights: 0,
            last_mission: None,
            current_mission_id: None,
            max_flight_time_min: 30,
            max_speed_kmh: 45,
        }
    }

    #[test]
    fn assign_flips_status_and_stamps_flight() {
        let mut fleet = FleetService::new(vec![drone("d1", "HangarA", 90)]);
        let assigned = fleet.assign("m1", Some("HangarA")).unwrap();
        assert_eq!(assigned.id, "d1");
        assert_eq!(assigned.status, DroneStatus::InMission);
        assert_eq!(assigned.total_flights, 1);
        assert!(assigned.last_mission.is_some());
        assert_eq!(assigned.current_mission_id.as_deref(), Some("m1"));
    }

    #[test]
    fn assigned_drone_is_exclusive_until_released() {
        let mut fleet = FleetService::new(vec![drone("d1", "HangarA", 90)]);
        assert!(fleet.assign("m1", Some("HangarA")).is_some());
        assert!(fleet.assign("m2", Some("HangarA")).is_none());

        fleet.release("d1").unwrap();
        let again = fleet.assign("m2", Some("HangarA")).unwrap();
        assert_eq!(again.id, "d1");
        assert_eq!(again.current_mission_id.as_deref(), Some("m2"));
    }

    #[test]
    fn second_assign_picks_a_different_drone_when_available() {
        let mut fleet =
            FleetService::new(vec![drone("d1", "HangarA", 90), drone("d2", "HangarA", 70)]);
        let first = fleet.assign("m1", Some("HangarA")).unwrap();
        let second = fleet.assign("m2", Some("HangarA")).unwrap();
        assert_eq!(first.id, "d1");
        assert_eq!(second.id, "d2");
    }

    #[test]
    fn location_filter_excludes_other_hangars() {
        let mut fleet = FleetService::new(vec![drone("d1", "HangarA", 90)]);
        assert!(fleet.assign("m1", Some("HangarB")).is_none());
        assert!(fleet.assign("m1", Some("HangarA")).is_some());
    }

    #[test]
    fn first_fit_ignores_location_when_unspecified() {
        let mut fleet = FleetService::new(vec![drone("d1", "HangarB", 90)]);
        assert_eq!(fleet.assign("m1", None).unwrap().id, "d1");
    }

    #[test]
    fn release_applies_battery_penalty_floored_at_zero() {
        let mut fleet = FleetService::new(vec![drone("d1", "HangarA", 7)]);
        fleet.assign("m1", None).unwrap();
        fleet.release("d1").unwrap();
        let d = fleet.drone("d1").unwrap();
        assert_eq!(d.status, DroneStatus::Available);
        assert_eq!(d.battery_pct, 0);
        assert!(d.current_mission_id.is_none());
    }

    #[test]
    fn release_unknown_drone_is_not_found() {
        let mut fleet = FleetService::new(Vec::new());
        assert_eq!(
            fleet.release("ghost"),
            Err(PlannerError::DroneNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn custom_selector_is_pluggable() {
        struct BestBattery;
        impl DroneSelector for BestBattery {
            fn select(&self, fleet: &[Drone], location: Option<&str>) -> Option<usize> {
                fleet
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        d.status == DroneStatus::Available
                            && location.is_none_or(|loc| d.location == loc)
                    })
                    .max_by_key(|(_, d)| d.battery_pct)
                    .map(|(i, _)| i)
            }
        }

        let mut fleet = FleetService::with_selector(
            vec![drone("d1", "HangarA", 40), drone("d2", "HangarA", 95)],
            Box::new(BestBattery),
        );
        assert_eq!(fleet.assign("m1", None).unwrap().id, "d2");
    }

    #[test]
    fn set_battery_clamps_to_full() {
        let mut fleet = FleetService::new(vec![drone("d1", "HangarA", 50)]);
        fleet.set_battery("d1", 250).unwrap();
        assert_eq!(fleet.drone("d1").unwrap().battery_pct, 100);
        fleet.set_battery("d1", 35).unwrap();
        assert_eq!(fleet.drone("d1").unwrap().battery_pct, 35);
        assert_eq!(
            fleet.set_battery("ghost", 50),
            Err(PlannerError::DroneNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn stats_count_by_status() {
        let mut fleet =
            FleetService::new(vec![drone("d1", "HangarA", 90), drone("d2", "HangarA", 80)]);
        fleet.set_status("d2", DroneStatus::Maintenance).unwrap();
        let stats = fleet.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.available, 1);
        assert_eq!(stats.maintenance, 1);
        assert_eq!(stats.in_mission, 0);
    }
}
