//! Plan a demo survey mission from the command line.
//!
//! Seeds a small fleet on first run, creates a mission at the requested
//! location, draws a square survey area, and prints the derived flight
//! plan.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use survey_core::models::{Coordinate, Drone, DroneStatus};
use survey_engine::persistence::init_database;
use survey_engine::{Config, FleetStore, MissionPlanner};

#[derive(Parser)]
#[command(name = "survey-cli", about = "Drone survey mission planner")]
struct Args {
    /// SQLite database path (defaults to SURVEY_DB_PATH or data/survey.db)
    #[arg(long)]
    db: Option<String>,

    /// Mission name
    #[arg(long, default_value = "Demo survey")]
    name: String,

    /// Location to plan from
    #[arg(long, default_value = "Main Hangar")]
    location: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("survey_engine=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let db_path = args.db.unwrap_or(config.db_path);

    let db = init_database(&db_path, config.db_max_connections).await?;
    let fleet_store = Arc::new(db.fleet_store());
    if fleet_store.load().await?.is_empty() {
        tracing::info!("seeding demo fleet");
        fleet_store.save(&demo_fleet()).await?;
    }

    let (mut planner, writer) =
        MissionPlanner::bootstrap(Arc::new(db.mission_store()), fleet_store, None).await?;

    let mission = planner.create_mission(&args.name, "CLI demo mission", &args.location);
    println!("Mission {} created ({:?})", mission.id, mission.status);
    if let Some(name) = &mission.drone_name {
        println!("Assigned drone: {name}");
    } else {
        println!("No drone available at {}", args.location);
    }

    let summary = planner.update_survey_area(&mission.id, demo_square())?;
    println!("Waypoints:        {}", summary.waypoint_count);
    println!("Distance:         {:.1} m", summary.estimate.distance_m);
    println!("Duration:         {:.1} min", summary.estimate.duration_min);
    println!("Battery usage:    {:.0} %", summary.estimate.battery_pct);

    let stats = planner.fleet_stats();
    println!(
        "Fleet: {} total, {} available, {} in mission",
        stats.total, stats.available, stats.in_mission
    );

    planner.retention_trim(&args.location, config.retention_keep);

    drop(planner);
    writer.await?;
    Ok(())
}

/// A ~110m square survey area next to the demo hangar.
fn demo_square() -> Vec<Coordinate> {
    let (lat, lng) = (33.6846, -117.8265);
    vec![
        Coordinate::new(lat, lng),
        Coordinate::new(lat, lng + 0.001),
        Coordinate::new(lat + 0.001, lng + 0.001),
        Coordinate::new(lat + 0.001, lng),
    ]
}

fn demo_fleet() -> Vec<Drone> {
    let drone = |id: &str, name: &str, model: &str, battery, flights, time, speed| Drone {
        id: id.to_string(),
        name: name.to_string(),
        model: model.to_string(),
        status: DroneStatus::Available,
        battery_pct: battery,
        location: "Main Hangar".to_string(),
        total_flights: flights,
        last_mission: None,
        current_mission_id: None,
        max_flight_time_min: time,
        max_speed_kmh: speed,
    };
    vec![
        drone("drone-001", "Phantom Pro", "DJI Phantom 4 Pro", 92, 48, 30, 45),
        drone("drone-002", "Mavic Surveyor", "DJI Mavic 3", 85, 32, 25, 40),
        drone("drone-003", "Scout 1", "Autel EVO II", 78, 61, 35, 50),
    ]
}
