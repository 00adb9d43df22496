//! Engine configuration from environment.

use std::env;

use crate::lifecycle::RETENTION_KEEP_DEFAULT;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub db_max_connections: u32,
    pub retention_keep: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("SURVEY_DB_PATH").unwrap_or_else(|_| "data/survey.db".to_string()),
            db_max_connections: env::var("SURVEY_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            retention_keep: env::var("SURVEY_RETENTION_KEEP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETENTION_KEEP_DEFAULT),
        }
    }
}
