//! Typed errors shared across the planner.

use thiserror::Error;

/// Error kinds surfaced by the mission planner.
///
/// "No available drone" is deliberately not an error: assignment returns
/// `Option::None` and the caller decides what a drone-less mission means.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// A survey area with fewer than 3 points where geometry is required.
    #[error("survey area needs at least 3 points, got {0}")]
    InvalidGeometry(usize),

    #[error("mission not found: {0}")]
    MissionNotFound(String),

    #[error("drone not found: {0}")]
    DroneNotFound(String),

    /// Flight speed of zero or below would divide duration by zero.
    #[error("flight speed must be positive, got {0} m/s")]
    SpeedNotPositive(f64),
}
