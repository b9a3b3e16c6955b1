//! User repository for dashboard accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slaash_core::{AccessLevel, Email, StoreId, UserId};

use super::{RepositoryError, conflict_on_unique, timed};
use crate::models::User;
use crate::models::user::NewUser;

const USER_COLUMNS: &str =
    "id, storeid, firstname, lastname, email, accesslevel, createdat, updatedat";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    storeid: i32,
    firstname: String,
    lastname: String,
    email: String,
    accesslevel: AccessLevel,
    createdat: DateTime<Utc>,
    updatedat: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            store_id: StoreId::new(row.storeid),
            first_name: row.firstname,
            last_name: row.lastname,
            email,
            access_level: row.accesslevel,
            created_at: row.createdat,
            updated_at: row.updatedat,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: Option<String>,
}

/// Repository for dashboard users.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = timed(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(id)
                .fetch_optional(self.pool),
        )
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = timed(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(email)
                .fetch_optional(self.pool),
        )
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash (if one is set).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, password FROM users WHERE email = $1");
        let row = timed(
            sqlx::query_as::<_, UserWithPasswordRow>(&sql)
                .bind(email)
                .fetch_optional(self.pool),
        )
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password))),
            None => Ok(None),
        }
    }

    /// Get the stored password hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let row: Option<Option<String>> = timed(
            sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool),
        )
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Find the owner account of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn find_owner(&self, store_id: StoreId) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE storeid = $1 AND accesslevel = $2 ORDER BY id LIMIT 1"
        );
        let row = timed(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(store_id)
                .bind(AccessLevel::Owner)
                .fetch_optional(self.pool),
        )
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    pub async fn create(
        &self,
        user: &NewUser,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO users (storeid, firstname, lastname, email, password, accesslevel)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        );
        let row = timed(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(user.store_id)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.email)
                .bind(password_hash)
                .bind(user.access_level)
                .fetch_one(self.pool),
        )
        .await
        .map_err(|e| conflict_on_unique(e, "user email"))?;

        row.try_into()
    }

    /// Update a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist,
    /// `RepositoryError::Conflict` if the email belongs to another user.
    pub async fn update_profile(
        &self,
        id: UserId,
        first_name: &str,
        last_name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            UPDATE users
               SET firstname = $2, lastname = $3, email = $4, updatedat = NOW()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        );
        let row = timed(
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(id)
                .bind(first_name)
                .bind(last_name)
                .bind(email)
                .fetch_optional(self.pool),
        )
        .await
        .map_err(|e| conflict_on_unique(e, "user email"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = timed(
            sqlx::query("UPDATE users SET password = $2, updatedat = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
