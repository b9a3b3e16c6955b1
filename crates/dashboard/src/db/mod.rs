//! Database operations for the dashboard `PostgreSQL`.
//!
//! ## Tables
//!
//! - `store` - Installed Shopify stores, their token and deal-list settings
//! - `users` - Dashboard users (store owners and staff)
//! - `campaign` / `campaign_product` - Discount campaigns and their products
//! - `price_rule` / `discount_code` - Local mirror of Shopify discounts
//! - `checkout` / `visitor` - Deal-list activity used by the analytics endpoints
//! - `buyer` - Shoppers that received a deal
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/dashboard/migrations/` and run via:
//! ```bash
//! cargo run -p slaash-cli -- migrate
//! ```
//!
//! Every query runs under [`QUERY_TIMEOUT`]; a slow database surfaces as
//! [`RepositoryError::Timeout`] instead of holding the request open.

pub mod activity;
pub mod buyers;
pub mod campaigns;
pub mod discounts;
pub mod stores;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use activity::ActivityRepository;
pub use buyers::BuyerRepository;
pub use campaigns::CampaignRepository;
pub use discounts::DiscountRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;

/// Upper bound for a single repository query.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The query did not finish within [`QUERY_TIMEOUT`].
    #[error("query timed out after {}s", QUERY_TIMEOUT.as_secs())]
    Timeout,
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options()
        .connect(database_url.expose_secret())
        .await
}

/// Pool settings shared by the server and the CLI.
#[must_use]
pub fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(5)
        .max_lifetime(Duration::from_secs(5 * 60))
        .acquire_timeout(Duration::from_secs(10))
}

/// Run a query future under [`QUERY_TIMEOUT`].
pub(crate) async fn timed<T, F>(query: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    tokio::time::timeout(QUERY_TIMEOUT, query)
        .await
        .map_err(|_| RepositoryError::Timeout)?
        .map_err(RepositoryError::from)
}

/// Map unique-constraint violations to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: RepositoryError, what: &str) -> RepositoryError {
    match err {
        RepositoryError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("{what} already exists"))
        }
        other => other,
    }
}
