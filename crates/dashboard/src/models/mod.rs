//! Domain models for the dashboard.
//!
//! Repositories convert database rows into these validated types; route
//! handlers turn them into the PascalCase JSON the frontend expects.

pub mod buyer;
pub mod campaign;
pub mod discount;
pub mod session;
pub mod store;
pub mod user;

pub use buyer::Buyer;
pub use campaign::{Campaign, CampaignProduct, TopProduct};
pub use discount::{DiscountCode, PriceRule};
pub use session::{CurrentUser, keys as session_keys};
pub use store::{DealListSettings, Store};
pub use user::User;
