//! Slaash merchant dashboard library.
//!
//! Serves the JSON API behind the dashboard frontend, the Shopify app
//! install (OAuth) and dashboard password login. The binary in `main.rs`
//! and the `slaash-cli` tool both build on this crate.
//!
//! # Data sources
//!
//! - `PostgreSQL`: stores, users, campaigns, discounts, checkouts, visitors
//!   and sessions
//! - `ClickHouse`: raw clickstream, read per device for OTF scoring
//! - Shopify REST Admin API: products, themes, price rules, discount codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod clickstream;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
