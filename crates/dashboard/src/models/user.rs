//! Dashboard user domain types.

use chrono::{DateTime, Utc};

use slaash_core::{AccessLevel, Email, StoreId, UserId};

/// A dashboard user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub store_id: StoreId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub store_id: StoreId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub access_level: AccessLevel,
}
