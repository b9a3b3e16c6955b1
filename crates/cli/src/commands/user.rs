//! Dashboard user management.
//!
//! Owners are created automatically by the Shopify install flow; this
//! command adds further users with a password login.
//!
//! # Environment Variables
//!
//! - `SLAASH_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use slaash_core::{AccessLevel, Email, StoreId};
use slaash_dashboard::db::{RepositoryError, StoreRepository, UserRepository};
use slaash_dashboard::models::user::NewUser;
use slaash_dashboard::services::AuthError;
use slaash_dashboard::services::auth::{hash_password, validate_password};
use thiserror::Error;

use super::{DatabaseSetupError, connect};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Setup(#[from] DatabaseSetupError),

    #[error("{0}")]
    InvalidAccessLevel(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    Password(#[from] AuthError),

    #[error("Store {0} does not exist")]
    UnknownStore(i32),

    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Arguments of `user create`.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub store_id: i32,
    pub access_level: String,
    pub password: String,
}

/// Create a dashboard user and return its id.
pub async fn create(args: &CreateUser) -> Result<i32, UserError> {
    let access_level: AccessLevel = args
        .access_level
        .parse()
        .map_err(UserError::InvalidAccessLevel)?;
    let email =
        Email::parse(&args.email).map_err(|e| UserError::InvalidEmail(e.to_string()))?;
    validate_password(&args.password)?;
    let password_hash = hash_password(&args.password)?;

    let pool = connect().await?;

    let store_id = StoreId::new(args.store_id);
    if StoreRepository::new(&pool).get_by_id(store_id).await?.is_none() {
        return Err(UserError::UnknownStore(args.store_id));
    }

    tracing::info!("Creating user: {} ({})", email, access_level);

    let new_user = NewUser {
        store_id,
        first_name: args.first_name.trim().to_string(),
        last_name: args.last_name.trim().to_string(),
        email,
        access_level,
    };

    let user = UserRepository::new(&pool)
        .create(&new_user, Some(&password_hash))
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(args.email.clone()),
            other => other.into(),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Store: {}",
        user.id,
        user.email,
        user.store_id
    );

    Ok(user.id.as_i32())
}
