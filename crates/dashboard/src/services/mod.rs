//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - Password login and password changes (argon2)
//! - `otf` - On-the-fly visitor scoring

pub mod auth;
pub mod otf;

pub use auth::{AuthError, AuthService};
pub use otf::{AlwaysOtf, OtfScorer};
