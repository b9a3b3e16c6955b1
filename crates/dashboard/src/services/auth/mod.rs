//! Password authentication for dashboard users.
//!
//! Shopify OAuth installs create the owner account without a password;
//! a password can be set later from the profile page and then used on
//! `/user/login`.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use slaash_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Verify an email and password pair.
    ///
    /// Unknown emails and accounts without a password both fail with
    /// `InvalidCredentials`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email cannot be parsed and
    /// `AuthError::InvalidCredentials` if verification fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = hash.ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &hash)?;

        Ok(user)
    }

    /// Set a new password.
    ///
    /// When the account already has a password, `current` must match it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if `current` does not match,
    /// `AuthError::WeakPassword` if `new` is too short.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: Option<&str>,
        new: &str,
    ) -> Result<(), AuthError> {
        let existing = self.users.password_hash(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;

        if let Some(hash) = existing {
            let current = current.ok_or(AuthError::InvalidCredentials)?;
            verify_password(current, &hash)?;
        }

        validate_password(new)?;
        let hash = hash_password(new)?;
        self.users.update_password(user_id, &hash).await?;

        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
