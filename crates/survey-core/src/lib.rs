pub mod error;
pub mod estimate;
pub mod flight_path;
pub mod geo;
pub mod models;

pub use error::PlannerError;
pub use estimate::{estimate, path_distance, FlightEstimate, FULL_BATTERY_FLIGHT_MIN};
pub use flight_path::{generate_waypoints, MIN_AREA_POINTS};
pub use geo::{
    bounding_box, centroid, haversine_distance, order_by_centroid_angle, subdivide,
    EARTH_RADIUS_M,
};
pub use models::{
    BoundingBox, Coordinate, Drone, DroneStatus, Mission, MissionParameters, MissionStatus,
    ParameterUpdate, Sensor, SurveyPattern, Waypoint,
};
