//! Flight estimates derived from a generated waypoint sequence.

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::geo::haversine_distance;
use crate::models::{MissionParameters, Waypoint};

/// Minutes of flight assumed to drain a full battery. A simplifying linear
/// heuristic, not a physical model.
pub const FULL_BATTERY_FLIGHT_MIN: f64 = 30.0;

/// Derived cost of flying a waypoint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightEstimate {
    pub distance_m: f64,
    /// `f64::INFINITY` when the configured speed is not positive.
    pub duration_min: f64,
    /// Always within 0..=100.
    pub battery_pct: f64,
}

impl FlightEstimate {
    pub fn zero() -> Self {
        Self {
            distance_m: 0.0,
            duration_min: 0.0,
            battery_pct: 0.0,
        }
    }
}

/// Total great-circle path length over consecutive waypoints, in meters.
///
/// Zero for fewer than two waypoints.
pub fn path_distance(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| haversine_distance(pair[0].coordinates, pair[1].coordinates))
        .sum()
}

/// Flight duration in minutes for a path of `distance_m` meters.
///
/// Speed is UI-bounded to >= 1 m/s upstream, but this layer must not crash
/// on zero; callers that cannot guard should use [`estimate`], which maps
/// the error to an infinite-duration sentinel.
pub fn duration_minutes(distance_m: f64, speed_mps: f64) -> Result<f64, PlannerError> {
    if speed_mps <= 0.0 {
        return Err(PlannerError::SpeedNotPositive(speed_mps));
    }
    Ok(distance_m / speed_mps / 60.0)
}

/// Derive distance, duration, and battery usage for a waypoint sequence.
///
/// A non-positive speed yields `duration_min = f64::INFINITY` and battery
/// usage saturated at 100; display policy is the caller's concern.
pub fn estimate(waypoints: &[Waypoint], params: &MissionParameters) -> FlightEstimate {
    let distance_m = path_distance(waypoints);
    let duration_min =
        duration_minutes(distance_m, params.speed_mps).unwrap_or(f64::INFINITY);
    let battery_pct = (duration_min / FULL_BATTERY_FLIGHT_MIN * 100.0).min(100.0);
    FlightEstimate {
        distance_m,
        duration_min,
        battery_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Waypoint};

    fn path(points: &[(f64, f64)]) -> Vec<Waypoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| Waypoint::new(Coordinate::new(lat, lng), 50.0, i))
            .collect()
    }

    #[test]
    fn empty_and_single_paths_have_zero_distance() {
        assert_eq!(path_distance(&[]), 0.0);
        assert_eq!(path_distance(&path(&[(0.0, 0.0)])), 0.0);
    }

    #[test]
    fn distance_is_sum_of_pairwise_haversine() {
        let wps = path(&[(0.0, 0.0), (0.001, 0.0), (0.001, 0.001)]);
        let expected = haversine_distance(wps[0].coordinates, wps[1].coordinates)
            + haversine_distance(wps[1].coordinates, wps[2].coordinates);
        let total = path_distance(&wps);
        assert!((total - expected).abs() < 1e-9);
        assert!(total >= 0.0);
    }

    #[test]
    fn duration_follows_distance_over_speed() {
        let wps = path(&[(0.0, 0.0), (0.001, 0.0)]);
        let params = MissionParameters {
            speed_mps: 5.0,
            ..MissionParameters::default()
        };
        let est = estimate(&wps, &params);
        assert!((est.duration_min - est.distance_m / 5.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn zero_speed_yields_infinite_duration_and_full_battery() {
        let wps = path(&[(0.0, 0.0), (0.001, 0.0)]);
        let params = MissionParameters {
            speed_mps: 0.0,
            ..MissionParameters::default()
        };
        assert_eq!(
            duration_minutes(1.0, 0.0),
            Err(PlannerError::SpeedNotPositive(0.0))
        );
        let est = estimate(&wps, &params);
        assert!(est.duration_min.is_infinite());
        assert_eq!(est.battery_pct, 100.0);
    }

    #[test]
    fn battery_usage_is_bounded() {
        // ~111km at 1 m/s: duration vastly exceeds the 30-minute model.
        let wps = path(&[(0.0, 0.0), (1.0, 0.0)]);
        let params = MissionParameters {
            speed_mps: 1.0,
            ..MissionParameters::default()
        };
        let est = estimate(&wps, &params);
        assert_eq!(est.battery_pct, 100.0);

        let short = estimate(&path(&[(0.0, 0.0), (0.0001, 0.0)]), &params);
        assert!(short.battery_pct >= 0.0 && short.battery_pct <= 100.0);
    }

    #[test]
    fn empty_path_estimates_to_zero() {
        let est = estimate(&[], &MissionParameters::default());
        assert_eq!(est, FlightEstimate::zero());
    }
}
