//! Discount defaults and the price rules mirrored from Shopify.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use slaash_core::DiscountCategory;

use super::store_client;
use crate::db::discounts::NewPriceRule;
use crate::db::{DiscountRepository, StoreRepository};
use crate::error::{AppError, AppJson};
use crate::middleware::RequireUser;
use crate::models::{DiscountCode, PriceRule};
use crate::shopify::{PriceRuleInput, StoreClient};
use crate::state::AppState;

const TARGET_TYPE: &str = "line_item";
const TARGET_SELECTION: &str = "all";
const ALLOCATION_METHOD: &str = "across";
const CUSTOMER_SELECTION: &str = "all";

#[derive(Debug, Deserialize)]
pub struct ConfigDiscountsRequest {
    /// Integer sent as a string by the frontend.
    pub default_discount: String,
    pub discount_category: DiscountCategory,
}

impl ConfigDiscountsRequest {
    fn value(&self) -> Result<i32, AppError> {
        let value: i32 = self.default_discount.trim().parse().map_err(|_| {
            AppError::BadRequest(format!(
                "default_discount must be a whole number, got {:?}",
                self.default_discount
            ))
        })?;

        if !self.discount_category.accepts(value) {
            return Err(AppError::BadRequest(format!(
                "{value} is out of range for {}",
                self.discount_category
            )));
        }
        Ok(value)
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscountDefaults {
    pub default_discount: Option<i32>,
    pub discount_category: DiscountCategory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeView {
    pub code: String,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DiscountCode> for CodeView {
    fn from(code: DiscountCode) -> Self {
        Self {
            code: code.code,
            usage_count: code.usage_count,
            created_at: code.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceRuleView {
    pub price_rule_id: i32,
    pub shopify_id: i64,
    pub title: String,
    pub value_type: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    pub starts_at: DateTime<Utc>,
    pub codes: Vec<CodeView>,
}

impl PriceRuleView {
    fn new(rule: PriceRule, codes: Vec<DiscountCode>) -> Self {
        Self {
            price_rule_id: rule.id.as_i32(),
            shopify_id: rule.shopify_id,
            title: rule.title,
            value_type: rule.value_type,
            value: rule.value,
            starts_at: rule.starts_at,
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigDiscountsResponse {
    pub price_rule_id: i32,
    pub code: String,
    pub default_discount: i32,
    pub discount_category: DiscountCategory,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /api/discounts
pub async fn list_discounts(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<PriceRuleView>>, AppError> {
    let rules = DiscountRepository::new(state.pool())
        .list_with_codes(user.store_id)
        .await?;
    Ok(Json(
        rules
            .into_iter()
            .map(|(rule, codes)| PriceRuleView::new(rule, codes))
            .collect(),
    ))
}

/// GET /api/config_discount_defaults
pub async fn config_discount_defaults(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<DiscountDefaults>, AppError> {
    let store = StoreRepository::new(state.pool())
        .require(user.store_id)
        .await?;
    Ok(Json(DiscountDefaults {
        default_discount: store.default_discount,
        discount_category: store.discount_category,
    }))
}

/// POST /api/config_discounts
///
/// Creates a matching price rule and code in Shopify, mirrors both locally
/// and only then saves the store default. A store without a Shopify token
/// is refused before anything is written.
#[instrument(skip(state, user, body), fields(store_id = %user.store_id))]
pub async fn config_discounts(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    AppJson(body): AppJson<ConfigDiscountsRequest>,
) -> Result<Json<ConfigDiscountsResponse>, AppError> {
    let value = body.value()?;
    let category = body.discount_category;

    let stores = StoreRepository::new(state.pool());
    let store = stores.require(user.store_id).await?;
    let client = store_client(&state, &store)?;

    let input = price_rule_input(value, category, Utc::now());
    let rule = client.create_price_rule(&input).await?;

    let code = discount_code(value, &uuid::Uuid::new_v4());
    let shopify_code = match client.create_discount_code(rule.id, &code).await {
        Ok(created) => created,
        Err(e) => {
            discard_price_rule(&client, rule.id).await;
            return Err(e.into());
        }
    };

    let discounts = DiscountRepository::new(state.pool());
    let local_rule = discounts
        .create_price_rule(&NewPriceRule {
            shopify_id: rule.id,
            store_id: store.id,
            title: &rule.title,
            target_type: &rule.target_type,
            target_selection: &rule.target_selection,
            value_type: &rule.value_type,
            value: rule.value,
            customer_selection: &rule.customer_selection,
            allocation_method: &rule.allocation_method,
            starts_at: rule.starts_at,
        })
        .await?;
    discounts
        .create_discount_code(local_rule.id, shopify_code.id, &shopify_code.code)
        .await?;

    stores
        .update_discount_defaults(store.id, value, category)
        .await?;

    tracing::info!(
        price_rule_id = %local_rule.id,
        shopify_price_rule_id = rule.id,
        code = %shopify_code.code,
        "discount defaults configured"
    );

    Ok(Json(ConfigDiscountsResponse {
        price_rule_id: local_rule.id.as_i32(),
        code: shopify_code.code,
        default_discount: value,
        discount_category: category,
    }))
}

/// Remove a price rule whose discount code could not be created.
async fn discard_price_rule(client: &StoreClient, shopify_price_rule_id: i64) {
    match client.delete_price_rule(shopify_price_rule_id).await {
        Ok(()) => tracing::warn!(
            shopify_price_rule_id,
            "discount code creation failed, price rule deleted"
        ),
        Err(e) => tracing::error!(
            shopify_price_rule_id,
            error = %e,
            "discount code creation failed, price rule left in Shopify"
        ),
    }
}

fn price_rule_input(value: i32, category: DiscountCategory, now: DateTime<Utc>) -> PriceRuleInput {
    PriceRuleInput {
        title: format!("SLAASH-{value}"),
        target_type: TARGET_TYPE.to_string(),
        target_selection: TARGET_SELECTION.to_string(),
        allocation_method: ALLOCATION_METHOD.to_string(),
        value_type: category.as_str().to_string(),
        value: -Decimal::from(value),
        customer_selection: CUSTOMER_SELECTION.to_string(),
        starts_at: now,
    }
}

/// `SLAASH-{value}-{8 hex chars}`, upper case.
fn discount_code(value: i32, id: &uuid::Uuid) -> String {
    let simple = id.simple().to_string();
    let suffix = simple.get(..8).unwrap_or(&simple);
    format!("SLAASH-{value}-{}", suffix.to_uppercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(value: &str, category: DiscountCategory) -> ConfigDiscountsRequest {
        ConfigDiscountsRequest {
            default_discount: value.to_string(),
            discount_category: category,
        }
    }

    #[test]
    fn test_request_deserializes_string_value() {
        let body: ConfigDiscountsRequest = serde_json::from_str(
            r#"{"default_discount":"15","discount_category":"fixed_amount"}"#,
        )
        .unwrap();
        assert_eq!(body.value().unwrap(), 15);
        assert_eq!(body.discount_category, DiscountCategory::FixedAmount);
    }

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(request("100", DiscountCategory::Percentage).value().unwrap(), 100);
        assert!(request("0", DiscountCategory::Percentage).value().is_err());
        assert!(request("101", DiscountCategory::Percentage).value().is_err());
        assert_eq!(request(" 7 ", DiscountCategory::Percentage).value().unwrap(), 7);
    }

    #[test]
    fn test_fixed_amount_allows_large_values() {
        assert_eq!(request("500", DiscountCategory::FixedAmount).value().unwrap(), 500);
        assert!(request("-5", DiscountCategory::FixedAmount).value().is_err());
    }

    #[test]
    fn test_non_numeric_value_is_bad_request() {
        assert!(matches!(
            request("ten", DiscountCategory::Percentage).value(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_price_rule_input_is_negative_line_item_rule() {
        let input = price_rule_input(20, DiscountCategory::Percentage, Utc::now());
        assert_eq!(input.title, "SLAASH-20");
        assert_eq!(input.value, Decimal::new(-20, 0));
        assert_eq!(input.value_type, "percentage");
        assert_eq!(input.target_type, "line_item");
        assert_eq!(input.allocation_method, "across");
    }

    #[test]
    fn test_discount_code_format() {
        let id = uuid::Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(discount_code(10, &id), "SLAASH-10-A1B2C3D4");
    }
}
