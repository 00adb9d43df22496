//! SQLite-backed mission and fleet stores.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

use survey_core::models::{
    Coordinate, Drone, DroneStatus, Mission, MissionParameters, MissionStatus, SurveyPattern,
    Waypoint,
};

use super::{FleetStore, MissionStore};

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn mission_store(&self) -> SqliteMissionStore {
        SqliteMissionStore {
            pool: self.pool.clone(),
        }
    }

    pub fn fleet_store(&self) -> SqliteFleetStore {
        SqliteFleetStore {
            pool: self.pool.clone(),
        }
    }
}

/// Initialize the SQLite database.
///
/// Creates the database file if it doesn't exist, runs migrations, and
/// returns a connection pool.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path);
    info!("Connecting to database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&db_url)
        .await?;

    run_migrations(&pool).await?;
    Ok(Database { pool })
}

/// Initialize an in-memory database (tests, throwaway sessions).
///
/// The pool is capped at one connection: each `:memory:` connection is its
/// own database.
pub async fn init_in_memory() -> Result<Database> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    run_migrations(&pool).await?;
    Ok(Database { pool })
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migration_sql = include_str!("../../migrations/001_init.sql");
    info!("Running database migrations...");

    for statement in migration_sql.split(';') {
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database migrations complete");
    Ok(())
}

pub struct SqliteMissionStore {
    pool: SqlitePool,
}

#[async_trait]
impl MissionStore for SqliteMissionStore {
    async fn put(&self, mission: &Mission) -> Result<()> {
        let survey_area = serde_json::to_string(&mission.survey_area)?;
        let waypoints = serde_json::to_string(&mission.waypoints)?;
        let parameters = serde_json::to_string(&mission.parameters)?;

        sqlx::query(
            r#"
            INSERT INTO missions (
                id, name, description, location, status,
                drone_id, drone_name, created_at, completed_at, scheduled_for,
                progress, survey_area, waypoints, survey_pattern,
                estimated_distance_m, estimated_duration_min, estimated_battery_pct,
                parameters
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ON CONFLICT(id) DO UPDATE SET
                name = ?2, description = ?3, location = ?4, status = ?5,
                drone_id = ?6, drone_name = ?7, completed_at = ?9, scheduled_for = ?10,
                progress = ?11, survey_area = ?12, waypoints = ?13, survey_pattern = ?14,
                estimated_distance_m = ?15, estimated_duration_min = ?16,
                estimated_battery_pct = ?17, parameters = ?18
            "#,
        )
        .bind(&mission.id)
        .bind(&mission.name)
        .bind(&mission.description)
        .bind(&mission.location)
        .bind(format!("{:?}", mission.status))
        .bind(&mission.drone_id)
        .bind(&mission.drone_name)
        .bind(mission.created_at.to_rfc3339())
        .bind(mission.completed_at.map(|t| t.to_rfc3339()))
        .bind(mission.scheduled_for.map(|t| t.to_rfc3339()))
        .bind(mission.progress as i64)
        .bind(&survey_area)
        .bind(&waypoints)
        .bind(format!("{:?}", mission.survey_pattern))
        .bind(mission.estimated_distance_m)
        .bind(mission.estimated_duration_min)
        .bind(mission.estimated_battery_pct)
        .bind(&parameters)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Mission>> {
        let row = sqlx::query_as::<_, MissionRow>(&format!(
            "{MISSION_COLUMNS} WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Mission>> {
        let rows = sqlx::query_as::<_, MissionRow>(MISSION_COLUMNS)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_location(&self, location: &str) -> Result<Vec<Mission>> {
        let rows = sqlx::query_as::<_, MissionRow>(&format!(
            "{MISSION_COLUMNS} WHERE location = ?1"
        ))
        .bind(location)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM missions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn retention_trim(&self, location: &str, keep: usize) -> Result<usize> {
        let result = sqlx::query(
            r#"
            DELETE FROM missions
            WHERE location = ?1 AND id NOT IN (
                SELECT id FROM missions
                WHERE location = ?1
                ORDER BY created_at DESC
                LIMIT ?2
            )
            "#,
        )
        .bind(location)
        .bind(keep as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as usize)
    }
}

const MISSION_COLUMNS: &str = "SELECT id, name, description, location, status, drone_id, drone_name, created_at, completed_at, scheduled_for, progress, survey_area, waypoints, survey_pattern, estimated_distance_m, estimated_duration_min, estimated_battery_pct, parameters FROM missions";

#[derive(sqlx::FromRow)]
struct MissionRow {
    id: String,
    name: String,
    description: String,
    location: String,
    status: String,
    drone_id: Option<String>,
    drone_name: Option<String>,
    created_at: String,
    completed_at: Option<String>,
    scheduled_for: Option<String>,
    progress: i64,
    survey_area: String,
    waypoints: String,
    survey_pattern: String,
    estimated_distance_m: f64,
    estimated_duration_min: f64,
    estimated_battery_pct: f64,
    parameters: String,
}

impl TryFrom<MissionRow> for Mission {
    type Error = anyhow::Error;

    fn try_from(row: MissionRow) -> Result<Self> {
        let status = match row.status.as_str() {
            "Pending" => MissionStatus::Pending,
            "Assigned" => MissionStatus::Assigned,
            "Scheduled" => MissionStatus::Scheduled,
            "Ready" => MissionStatus::Ready,
            "InProgress" => MissionStatus::InProgress,
            "Completed" => MissionStatus::Completed,
            "Cancelled" => MissionStatus::Cancelled,
            _ => MissionStatus::Pending,
        };
        let survey_pattern = match row.survey_pattern.as_str() {
            "Crosshatch" => SurveyPattern::Crosshatch,
            "Perimeter" => SurveyPattern::Perimeter,
            "Custom" => SurveyPattern::Custom,
            _ => SurveyPattern::Grid,
        };

        let survey_area: Vec<Coordinate> = serde_json::from_str(&row.survey_area)?;
        let waypoints: Vec<Waypoint> = serde_json::from_str(&row.waypoints)?;
        let parameters: MissionParameters = serde_json::from_str(&row.parameters)?;

        Ok(Mission {
            id: row.id,
            name: row.name,
            description: row.description,
            location: row.location,
            status,
            drone_id: row.drone_id,
            drone_name: row.drone_name,
            created_at: parse_ts(&row.created_at)?,
            completed_at: row.completed_at.as_deref().map(parse_ts).transpose()?,
            scheduled_for: row.scheduled_for.as_deref().map(parse_ts).transpose()?,
            progress: row.progress.clamp(0, 100) as u8,
            survey_area,
            waypoints,
            survey_pattern,
            estimated_distance_m: row.estimated_distance_m,
            estimated_duration_min: row.estimated_duration_min,
            estimated_battery_pct: row.estimated_battery_pct,
            parameters,
        })
    }
}

pub struct SqliteFleetStore {
    pool: SqlitePool,
}

#[async_trait]
impl FleetStore for SqliteFleetStore {
    async fn load(&self) -> Result<Vec<Drone>> {
        let rows = sqlx::query_as::<_, DroneRow>(
            "SELECT id, name, model, status, battery_pct, location, total_flights, last_mission, current_mission_id, max_flight_time_min, max_speed_kmh FROM drones"
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn save(&self, fleet: &[Drone]) -> Result<()> {
        // Whole-collection replace, matching the gateway contract.
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM drones").execute(&mut *tx).await?;
        for drone in fleet {
            sqlx::query(
                r#"
                INSERT INTO drones (
                    id, name, model, status, battery_pct, location,
                    total_flights, last_mission, current_mission_id,
                    max_flight_time_min, max_speed_kmh
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&drone.id)
            .bind(&drone.name)
            .bind(&drone.model)
            .bind(format!("{:?}", drone.status))
            .bind(drone.battery_pct as i64)
            .bind(&drone.location)
            .bind(drone.total_flights as i64)
            .bind(drone.last_mission.map(|t| t.to_rfc3339()))
            .bind(&drone.current_mission_id)
            .bind(drone.max_flight_time_min as i64)
            .bind(drone.max_speed_kmh as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DroneRow {
    id: String,
    name: String,
    model: String,
    status: String,
    battery_pct: i64,
    location: String,
    total_flights: i64,
    last_mission: Option<String>,
    current_mission_id: Option<String>,
    max_flight_time_min: i64,
    max_speed_kmh: i64,
}

impl TryFrom<DroneRow> for Drone {
    type Error = anyhow::Error;

    fn try_from(row: DroneRow) -> Result<Self> {
        let status = match row.status.as_str() {
            "InMission" => DroneStatus::InMission,
            "Maintenance" => DroneStatus::Maintenance,
            "Charging" => DroneStatus::Charging,
            _ => DroneStatus::Available,
        };
        Ok(Drone {
            id: row.id,
            name: row.name,
            model: row.model,
            status,
            battery_pct: row.battery_pct.clamp(0, 100) as u8,
            location: row.location,
            total_flights: row.total_flights.max(0) as u32,
            last_mission: row.last_mission.as_deref().map(parse_ts).transpose()?,
            current_mission_id: row.current_mission_id,
            max_flight_time_min: row.max_flight_time_min.max(0) as u32,
            max_speed_kmh: row.max_speed_kmh.max(0) as u32,
        })
    }
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
