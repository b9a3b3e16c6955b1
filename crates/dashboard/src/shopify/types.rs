//! Resource types for the Shopify REST Admin API.
//!
//! Field names follow the REST payloads (`snake_case`). Prices arrive as
//! decimal strings and are kept as [`Decimal`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Shop
// =============================================================================

/// The `shop.json` resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopInfo {
    pub id: i64,
    pub name: String,
    /// Contact email of the shop owner.
    pub email: String,
    pub domain: Option<String>,
    pub myshopify_domain: Option<String>,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Full name of the shop owner.
    pub shop_owner: Option<String>,
}

impl ShopInfo {
    /// Split `shop_owner` into first and last name.
    ///
    /// Falls back to the shop name when the owner is not set.
    #[must_use]
    pub fn owner_names(&self) -> (String, String) {
        let full = self
            .shop_owner
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name);
        match full.split_once(' ') {
            Some((first, last)) => (first.to_string(), last.trim().to_string()),
            None => (full.to_string(), String::new()),
        }
    }
}

// =============================================================================
// Themes
// =============================================================================

/// A theme installed on the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    /// `main` for the published theme, otherwise `unpublished` or `demo`.
    pub role: String,
}

impl Theme {
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.role == "main"
    }
}

/// A theme asset (template, script, stylesheet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Discounts
// =============================================================================

/// Fields for creating a price rule.
#[derive(Debug, Clone, Serialize)]
pub struct PriceRuleInput {
    pub title: String,
    pub target_type: String,
    pub target_selection: String,
    pub allocation_method: String,
    /// `percentage` or `fixed_amount`.
    pub value_type: String,
    /// Negative amount, e.g. `-10.0`.
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    pub customer_selection: String,
    pub starts_at: DateTime<Utc>,
}

/// A price rule as returned by Shopify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRule {
    pub id: i64,
    pub title: String,
    pub target_type: String,
    pub target_selection: String,
    pub allocation_method: String,
    pub value_type: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    pub customer_selection: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
}

/// A discount code under a price rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    pub id: i64,
    pub price_rule_id: i64,
    pub code: String,
    #[serde(default)]
    pub usage_count: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Orders and checkouts
// =============================================================================

/// A line of an order or checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    pub title: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Customer reference embedded in orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Display name, e.g. `#1001`.
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_discounts: Decimal,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// A checkout the buyer left before paying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbandonedCheckout {
    pub id: i64,
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub abandoned_checkout_url: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub orders_count: Option<i64>,
    #[serde(default)]
    pub total_spent: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: i64,
    pub title: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub image: Option<ProductImage>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// URL of the featured image, or the first image by position.
    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        if let Some(image) = &self.image {
            return Some(&image.src);
        }
        self.images
            .iter()
            .min_by_key(|i| i.position.unwrap_or(i32::MAX))
            .map(|i| i.src.as_str())
    }
}

// =============================================================================
// Webhooks
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WebhookInput {
    /// e.g. `orders/create`.
    pub topic: String,
    pub address: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: i64,
    pub topic: String,
    pub address: String,
    pub format: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
