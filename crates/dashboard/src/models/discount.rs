//! Local mirror of Shopify price rules and discount codes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use slaash_core::{DiscountCodeId, PriceRuleId, StoreId};

/// A Shopify price rule created through the dashboard.
#[derive(Debug, Clone)]
pub struct PriceRule {
    pub id: PriceRuleId,
    /// Shopify price rule id.
    pub shopify_id: i64,
    pub store_id: StoreId,
    pub title: String,
    pub target_type: String,
    pub target_selection: String,
    pub value_type: String,
    /// Negative amount, as Shopify stores it.
    pub value: Decimal,
    pub customer_selection: String,
    pub allocation_method: String,
    pub starts_at: DateTime<Utc>,
}

/// A discount code attached to a [`PriceRule`].
#[derive(Debug, Clone)]
pub struct DiscountCode {
    pub id: DiscountCodeId,
    pub price_rule_id: PriceRuleId,
    pub shopify_id: i64,
    pub code: String,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
