//! Persistence store: profiles, chat memory, agent state and counters in one
//! SQLite file.

mod memory;
mod profiles;
mod stats;

pub use profiles::{NewProfile, ProfileUpdate};

use sqlx::SqlitePool;

use crate::config::DatabaseConfig;
use crate::db;
use crate::error::Result;

pub const DAILY_LOGS_STAT: &str = "daily_logs";

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database file, creating it and the schema if needed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = db::create_pool(config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
pub(crate) async fn test_store() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("intern.db").to_string_lossy().into_owned(),
        max_connections: 1,
    };
    (Store::connect(&config).await.unwrap(), dir)
}
