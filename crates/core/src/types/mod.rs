//! Core types for Slaash.
//!
//! Type-safe wrappers for the dashboard's domain concepts.

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
