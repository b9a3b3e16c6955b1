//! Campaign status, history and trending products.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use slaash_core::analytics::{ComparisonWindow, hours_until, next_day_start};
use slaash_core::{CampaignStatus, Money, Vertical};

use super::{or_zero, store_client};
use crate::db::{ActivityRepository, CampaignRepository, StoreRepository};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::{Campaign, TopProduct};
use crate::state::AppState;

/// Number of products on the trending list.
const TRENDING_LIMIT: i64 = 5;

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TurnOffResponse {
    pub turn_off_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CampaignEndTime {
    /// RFC 3339 end instant.
    pub value: String,
    /// Whole hours until the end, never negative.
    pub next_in: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscountValue {
    pub value: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GmvActiveSession {
    pub currency_type: String,
    pub value: i64,
    pub gmv_vertical: Vertical,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductsActiveSession {
    pub products: i64,
    pub products_vertical: Vertical,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActiveUsers {
    pub active_users_in_session: i64,
    pub active_users_vertical: Vertical,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CampaignActivity {
    pub campaign_end_time: CampaignEndTime,
    pub discount: DiscountValue,
    pub gmv_active_session: GmvActiveSession,
    pub products_active_session: ProductsActiveSession,
    pub active_users: ActiveUsers,
    pub active_campaign_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrendingProduct {
    pub product_name: String,
    pub product_image: String,
    /// Deals handed out for the product.
    pub users: i64,
    pub discount: Money,
    pub gmv: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrendingProducts {
    pub products: Vec<TrendingProduct>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CampaignSummary {
    pub campaign_id: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub discount: i32,
    pub active: bool,
}

impl From<Campaign> for CampaignSummary {
    fn from(campaign: Campaign) -> Self {
        Self {
            campaign_id: campaign.id.as_i32(),
            starts_at: campaign.starts_at,
            ends_at: campaign.ends_at,
            discount: campaign.discount,
            active: campaign.status == CampaignStatus::Active,
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /api/turn_off_next_campaign
///
/// Pauses campaign scheduling until the next UTC midnight.
#[instrument(skip(state, user), fields(store_id = %user.store_id))]
pub async fn turn_off_next_campaign(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<TurnOffResponse>, AppError> {
    let at = next_day_start(Utc::now());
    StoreRepository::new(state.pool())
        .set_campaign_turn_off(user.store_id, at)
        .await?;

    tracing::info!(turn_off_at = %at, "next campaign turned off");
    Ok(Json(TurnOffResponse {
        turn_off_at: at.to_rfc3339(),
    }))
}

/// GET /api/campaign_activity
///
/// Totals since the active campaign started, compared with the window of
/// equal length before it.
#[instrument(skip(state, user), fields(store_id = %user.store_id))]
pub async fn campaign_activity(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CampaignActivity>, AppError> {
    let store = StoreRepository::new(state.pool())
        .require(user.store_id)
        .await?;
    let campaign = CampaignRepository::new(state.pool())
        .latest_active(store.id)
        .await?
        .ok_or_else(|| AppError::NotFound("no active campaign".to_string()))?;

    let now = Utc::now();
    let window = ComparisonWindow::trailing(campaign.starts_at, now);
    let activity = ActivityRepository::new(state.pool());

    let money_now = or_zero(
        activity.checkout_totals(store.id, &window.current).await,
        "checkout_totals.current",
    );
    let money_before = or_zero(
        activity.checkout_totals(store.id, &window.previous).await,
        "checkout_totals.previous",
    );
    let visitors_now = or_zero(
        activity.visitor_totals(store.id, &window.current).await,
        "visitor_totals.current",
    );
    let visitors_before = or_zero(
        activity.visitor_totals(store.id, &window.previous).await,
        "visitor_totals.previous",
    );

    Ok(Json(CampaignActivity {
        campaign_end_time: CampaignEndTime {
            value: campaign.ends_at.to_rfc3339(),
            next_in: hours_until(campaign.ends_at, now),
        },
        discount: DiscountValue {
            value: money_now.discount,
        },
        gmv_active_session: GmvActiveSession {
            currency_type: store.currency,
            value: money_now.gmv,
            gmv_vertical: Vertical::between(money_now.gmv, money_before.gmv),
        },
        products_active_session: ProductsActiveSession {
            products: visitors_now.products,
            products_vertical: Vertical::between(visitors_now.products, visitors_before.products),
        },
        active_users: ActiveUsers {
            active_users_in_session: visitors_now.users,
            active_users_vertical: Vertical::between(visitors_now.users, visitors_before.users),
        },
        active_campaign_id: campaign.id.as_i32(),
    }))
}

/// GET /api/trending_products
///
/// The five products with the most deals. Names and images come from
/// Shopify; when that lookup fails the stored title is used.
#[instrument(skip(state, user), fields(store_id = %user.store_id))]
pub async fn trending_products(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<TrendingProducts>, AppError> {
    let store = StoreRepository::new(state.pool())
        .require(user.store_id)
        .await?;
    let top = CampaignRepository::new(state.pool())
        .top_products(store.id, TRENDING_LIMIT)
        .await?;

    let client = store_client(&state, &store)
        .inspect_err(|e| tracing::warn!(error = %e, "product lookups disabled"))
        .ok();

    let mut products = Vec::with_capacity(top.len());
    for product in top {
        let shopify_product = match &client {
            Some(client) => client
                .get_product(product.product_id)
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        error = %e,
                        product_id = product.product_id,
                        "product lookup failed, using stored title"
                    );
                })
                .ok(),
            None => None,
        };

        let (name, image) = shopify_product.map_or_else(
            || (product.title.clone(), String::new()),
            |p| {
                let image = p.first_image().unwrap_or_default().to_string();
                (p.title, image)
            },
        );
        products.push(trending_entry(&product, name, image, &store.currency));
    }

    Ok(Json(TrendingProducts { products }))
}

fn trending_entry(
    product: &TopProduct,
    name: String,
    image: String,
    currency: &str,
) -> TrendingProduct {
    TrendingProduct {
        product_name: name,
        product_image: image,
        users: product.deals,
        discount: Money::new(product.discount, currency),
        gmv: Money::new(product.gmv, currency),
    }
}

/// GET /api/past_campaigns
pub async fn past_campaigns(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<CampaignSummary>>, AppError> {
    let campaigns = CampaignRepository::new(state.pool())
        .list_by_store(user.store_id)
        .await?;
    Ok(Json(campaigns.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_entry_shape() {
        let product = TopProduct {
            product_id: 42,
            title: "Mug".to_string(),
            deals: 9,
            discount: 150,
            gmv: 4_500,
        };
        let entry = trending_entry(&product, "Mug".to_string(), String::new(), "EUR");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["ProductName"], "Mug");
        assert_eq!(json["ProductImage"], "");
        assert_eq!(json["Users"], 9);
        assert_eq!(json["Discount"]["Value"], 150);
        assert_eq!(json["Discount"]["CurrencyType"], "EUR");
        assert_eq!(json["Gmv"]["Value"], 4_500);
    }

    #[test]
    fn test_campaign_activity_field_names() {
        let activity = CampaignActivity {
            campaign_end_time: CampaignEndTime {
                value: "2026-01-01T00:00:00+00:00".to_string(),
                next_in: 3,
            },
            discount: DiscountValue { value: 10 },
            gmv_active_session: GmvActiveSession {
                currency_type: "USD".to_string(),
                value: 200,
                gmv_vertical: Vertical::between(200, 100),
            },
            products_active_session: ProductsActiveSession {
                products: 2,
                products_vertical: Vertical::between(2, 0),
            },
            active_users: ActiveUsers {
                active_users_in_session: 1,
                active_users_vertical: Vertical::between(1, 2),
            },
            active_campaign_id: 5,
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["CampaignEndTime"]["NextIn"], 3);
        assert_eq!(json["GmvActiveSession"]["GmvVertical"]["Positive"], true);
        assert_eq!(
            json["GmvActiveSession"]["GmvVertical"]["ChangePercentage"],
            100.0
        );
        assert_eq!(
            json["ProductsActiveSession"]["ProductsVertical"]["ChangePercentage"],
            100.0
        );
        assert_eq!(json["ActiveUsers"]["ActiveUsersVertical"]["Positive"], false);
        assert_eq!(json["ActiveCampaignId"], 5);
    }
}
