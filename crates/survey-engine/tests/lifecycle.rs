//! End-to-end planner tests: bootstrap from stores, mutate through the
//! lifecycle, and verify the write-behind queue reaches the gateway.

use std::sync::Arc;

use survey_core::models::{Coordinate, Drone, DroneStatus, MissionStatus};
use survey_engine::persistence::{InMemoryFleetStore, InMemoryMissionStore};
use survey_engine::{FleetStore, MissionPlanner, MissionStore};

fn hangar_drone() -> Drone {
    Drone {
        id: "drone-001".to_string(),
        name: "Phantom Pro".to_string(),
        model: "DJI Phantom 4 Pro".to_string(),
        status: DroneStatus::Available,
        battery_pct: 92,
        location: "Main Hangar".to_string(),
        total_flights: 48,
        last_mission: None,
        current_mission_id: None,
        max_flight_time_min: 30,
        max_speed_kmh: 45,
    }
}

fn square() -> Vec<Coordinate> {
    vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(0.0, 0.001),
        Coordinate::new(0.001, 0.001),
        Coordinate::new(0.001, 0.0),
    ]
}

#[tokio::test]
async fn mutations_flow_through_to_the_stores() {
    let missions = Arc::new(InMemoryMissionStore::new());
    let fleet = Arc::new(InMemoryFleetStore::seeded(vec![hangar_drone()]));
    let (mut planner, writer) =
        MissionPlanner::bootstrap(missions.clone(), fleet.clone(), None)
            .await
            .unwrap();

    let mission = planner.create_mission("Roof survey", "North roof", "Main Hangar");
    assert_eq!(mission.status, MissionStatus::Assigned);
    planner.update_survey_area(&mission.id, square()).unwrap();
    planner.cancel(&mission.id).unwrap();

    // Drop the planner (and its persist handle) so the writer drains.
    drop(planner);
    writer.await.unwrap();

    let stored = missions.get(&mission.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MissionStatus::Cancelled);
    assert!(!stored.survey_area.is_empty());
    assert!(stored.completed_at.is_some());

    let stored_fleet = fleet.load().await.unwrap();
    assert_eq!(stored_fleet[0].status, DroneStatus::Available);
    assert_eq!(stored_fleet[0].battery_pct, 82);
    assert_eq!(stored_fleet[0].total_flights, 49);
}

#[tokio::test]
async fn bootstrap_restores_previous_state() {
    let missions = Arc::new(InMemoryMissionStore::new());
    let fleet = Arc::new(InMemoryFleetStore::seeded(vec![hangar_drone()]));

    let first_id = {
        let (mut planner, writer) =
            MissionPlanner::bootstrap(missions.clone(), fleet.clone(), None)
                .await
                .unwrap();
        let mission = planner.create_mission("Session one", "", "Main Hangar");
        planner.update_survey_area(&mission.id, square()).unwrap();
        drop(planner);
        writer.await.unwrap();
        mission.id
    };

    let (planner, _writer) = MissionPlanner::bootstrap(missions, fleet, None)
        .await
        .unwrap();
    let restored = planner.get(&first_id).unwrap();
    assert_eq!(restored.name, "Session one");
    assert!(!restored.waypoints.is_empty());
    // The drone is still bound to the restored mission.
    assert_eq!(
        planner.drone("drone-001").unwrap().current_mission_id,
        Some(first_id)
    );
}

#[tokio::test]
async fn exhausted_fleet_leaves_missions_pending() {
    let missions = Arc::new(InMemoryMissionStore::new());
    let fleet = Arc::new(InMemoryFleetStore::seeded(vec![hangar_drone()]));
    let (mut planner, _writer) = MissionPlanner::bootstrap(missions, fleet, None)
        .await
        .unwrap();

    let first = planner.create_mission("One", "", "Main Hangar");
    let second = planner.create_mission("Two", "", "Main Hangar");
    assert_eq!(first.status, MissionStatus::Assigned);
    assert_eq!(second.status, MissionStatus::Pending);
    assert!(second.drone_id.is_none());
}
