//! Database migration command.
//!
//! Migrations are embedded from `crates/dashboard/migrations/` at compile
//! time and include the `tower_sessions` session table.
//!
//! # Environment Variables
//!
//! - `SLAASH_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use super::{DatabaseSetupError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Setup(#[from] DatabaseSetupError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending dashboard migrations.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running dashboard migrations...");
    sqlx::migrate!("../dashboard/migrations").run(&pool).await?;

    tracing::info!("Dashboard migrations complete!");
    Ok(())
}
