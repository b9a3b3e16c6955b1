pub mod buyer;
pub mod campaign;
pub mod migrate;
pub mod shop;
pub mod user;

use slaash_core::StoreId;
use slaash_dashboard::config::{ConfigError, database_url_from_env};
use slaash_dashboard::db::{RepositoryError, StoreRepository};
use slaash_dashboard::models::Store;
use sqlx::PgPool;

/// Errors shared by commands that need the database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the dashboard database named by the environment.
pub async fn connect() -> Result<PgPool, DatabaseSetupError> {
    let database_url = database_url_from_env()?;
    tracing::info!("Connecting to dashboard database...");
    Ok(slaash_dashboard::db::create_pool(&database_url).await?)
}

/// Look a store up by numeric id or by shop domain.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` when no store matches.
pub async fn resolve_store(pool: &PgPool, store: &str) -> Result<Store, RepositoryError> {
    let stores = StoreRepository::new(pool);
    match store.parse::<i32>() {
        Ok(id) => stores.require(StoreId::new(id)).await,
        Err(_) => stores
            .get_by_url(store.trim())
            .await?
            .ok_or(RepositoryError::NotFound),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print<T, E>(value: &T) -> Result<(), E>
where
    T: serde::Serialize,
    E: From<serde_json::Error>,
{
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
