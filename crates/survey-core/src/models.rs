//! Core data models for survey mission planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 position in decimal degrees. No datum conversion is performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned bounds of a polygon, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// A single point of a generated flight path.
///
/// Waypoints are derived artifacts: they are regenerated as a batch whenever
/// the survey area, pattern, or parameters change, never patched in place.
/// The id is derived from the sequence index so that regeneration with
/// identical inputs reproduces an identical batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub coordinates: Coordinate,
    pub altitude_m: f64,
    pub sequence_index: usize,
}

impl Waypoint {
    pub fn new(coordinates: Coordinate, altitude_m: f64, sequence_index: usize) -> Self {
        Self {
            id: format!("wp-{sequence_index:04}"),
            coordinates,
            altitude_m,
            sequence_index,
        }
    }
}

/// Coverage pattern flown over the survey area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyPattern {
    #[default]
    Grid,
    Crosshatch,
    Perimeter,
    Custom,
}

/// Sensor payloads carried during the survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Rgb,
    Thermal,
    Lidar,
}

/// Flight parameters for a mission.
///
/// Hard ranges are enforced upstream by the UI; this layer only has to
/// tolerate any value >= 0 without panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionParameters {
    /// Capture interval in seconds; doubles as the waypoint spacing in
    /// meters along each subdivided edge.
    pub capture_frequency_s: f64,
    pub speed_mps: f64,
    pub altitude_m: f64,
    pub overlap_pct: f64,
    pub sensors: Vec<Sensor>,
}

impl Default for MissionParameters {
    fn default() -> Self {
        Self {
            capture_frequency_s: 5.0,
            speed_mps: 5.0,
            altitude_m: 50.0,
            overlap_pct: 70.0,
            sensors: vec![Sensor::Rgb],
        }
    }
}

/// Partial update merged over a mission's current parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub capture_frequency_s: Option<f64>,
    pub speed_mps: Option<f64>,
    pub altitude_m: Option<f64>,
    pub overlap_pct: Option<f64>,
    pub sensors: Option<Vec<Sensor>>,
}

impl ParameterUpdate {
    /// Merge the set fields over `params`, leaving the rest untouched.
    pub fn apply(&self, params: &mut MissionParameters) {
        if let Some(v) = self.capture_frequency_s {
            params.capture_frequency_s = v;
        }
        if let Some(v) = self.speed_mps {
            params.speed_mps = v;
        }
        if let Some(v) = self.altitude_m {
            params.altitude_m = v;
        }
        if let Some(v) = self.overlap_pct {
            params.overlap_pct = v;
        }
        if let Some(v) = &self.sensors {
            params.sensors = v.clone();
        }
    }
}

/// Mission status state machine.
///
/// `pending -> assigned -> in-progress -> {completed, cancelled}` with the
/// side branches `scheduled` (queued for future execution) and `ready`
/// (finalized plan, not yet flown) entered by explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissionStatus {
    Pending,
    Assigned,
    Scheduled,
    Ready,
    InProgress,
    Completed,
    Cancelled,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Cancelled)
    }
}

/// A survey mission: the aggregate root.
///
/// `waypoints` and the three `estimated_*` fields are a cache derived from
/// `(survey_area, survey_pattern, parameters)` as of the last regeneration.
/// They are recomputed together and must never be updated individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub status: MissionStatus,
    /// Weak reference to the assigned drone; lookup only, no ownership.
    pub drone_id: Option<String>,
    pub drone_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Completion percentage, clamped to 0..=100.
    pub progress: u8,
    pub survey_area: Vec<Coordinate>,
    pub waypoints: Vec<Waypoint>,
    pub survey_pattern: SurveyPattern,
    pub estimated_distance_m: f64,
    pub estimated_duration_min: f64,
    pub estimated_battery_pct: f64,
    pub parameters: MissionParameters,
}

impl Mission {
    /// Create a mission with an empty survey area and default parameters.
    pub fn new(id: String, name: String, description: String, location: String) -> Self {
        Self {
            id,
            name,
            description,
            location,
            status: MissionStatus::Pending,
            drone_id: None,
            drone_name: None,
            created_at: Utc::now(),
            completed_at: None,
            scheduled_for: None,
            progress: 0,
            survey_area: Vec::new(),
            waypoints: Vec::new(),
            survey_pattern: SurveyPattern::Grid,
            estimated_distance_m: 0.0,
            estimated_duration_min: 0.0,
            estimated_battery_pct: 0.0,
            parameters: MissionParameters::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DroneStatus {
    #[default]
    Available,
    InMission,
    Maintenance,
    Charging,
}

/// A drone in the fleet.
///
/// Drones are provisioned once and toggle status/battery/assignment for
/// their whole lifetime; this core never deletes them. At most one active
/// mission references a drone at a time (enforced by the assignment
/// service, not by the drone itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: String,
    pub name: String,
    pub model: String,
    pub status: DroneStatus,
    pub battery_pct: u8,
    pub location: String,
    pub total_flights: u32,
    pub last_mission: Option<DateTime<Utc>>,
    pub current_mission_id: Option<String>,
    pub max_flight_time_min: u32,
    pub max_speed_kmh: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_are_kebab_case() {
        let json = serde_json::to_string(&MissionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let json = serde_json::to_string(&DroneStatus::InMission).unwrap();
        assert_eq!(json, "\"in-mission\"");
    }

    #[test]
    fn parameter_update_merges_only_set_fields() {
        let mut params = MissionParameters::default();
        let patch = ParameterUpdate {
            speed_mps: Some(8.0),
            sensors: Some(vec![Sensor::Rgb, Sensor::Thermal]),
            ..ParameterUpdate::default()
        };
        patch.apply(&mut params);
        assert_eq!(params.speed_mps, 8.0);
        assert_eq!(params.sensors, vec![Sensor::Rgb, Sensor::Thermal]);
        // untouched fields keep their defaults
        assert_eq!(params.capture_frequency_s, 5.0);
        assert_eq!(params.altitude_m, 50.0);
    }

    #[test]
    fn terminal_states() {
        assert!(MissionStatus::Completed.is_terminal());
        assert!(MissionStatus::Cancelled.is_terminal());
        assert!(!MissionStatus::Ready.is_terminal());
        assert!(!MissionStatus::InProgress.is_terminal());
    }
}
