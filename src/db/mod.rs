pub mod models;
pub mod odds;
pub mod predictions;
pub mod schedule;
pub mod team_stats;

pub use odds::OddsRepo;
pub use predictions::PredictionRepo;
pub use schedule::ScheduleRepo;
pub use team_stats::TeamStatsRepo;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

use crate::error::Result;

/// Open (creating if needed) the database file and apply migrations.
pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Migrated in-memory database on a single connection, so every query sees
/// the same data.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
