//! Slaash Core - shared types for the merchant dashboard.
//!
//! This crate is used by:
//! - `dashboard` - the merchant-facing JSON API and OAuth endpoints
//! - `cli` - migrations, user management and Shopify maintenance commands
//!
//! # Architecture
//!
//! Only types and pure arithmetic live here: no I/O, no database access,
//! no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email addresses and status enums
//! - [`analytics`] - Reporting windows, percentage verticals and hourly series

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod types;

pub use analytics::{ComparisonWindow, DurationType, HourlySeries, Money, Vertical};
pub use types::*;
