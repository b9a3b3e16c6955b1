//! Campaign domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use slaash_core::{CampaignId, CampaignProductId, CampaignStatus, PriceRuleId, StoreId};

/// A time-bounded discount promotion.
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub store_id: StoreId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Discount percentage offered during the campaign.
    pub discount: i32,
    pub status: CampaignStatus,
    pub misc: Option<String>,
}

/// A product taking part in a campaign.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignProduct {
    pub id: CampaignProductId,
    pub campaign_id: CampaignId,
    pub store_id: StoreId,
    /// Shopify product id.
    pub product_id: i64,
    pub title: String,
    pub deals: i32,
    pub sold: i32,
    pub deal_discount: i32,
    pub email_sent_to: Vec<String>,
    pub price_rule_id: Option<PriceRuleId>,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to add a product to a campaign.
#[derive(Debug, Clone)]
pub struct NewCampaignProduct {
    pub campaign_id: CampaignId,
    pub store_id: StoreId,
    pub product_id: i64,
    pub title: String,
    pub deal_discount: i32,
    pub price: i64,
    pub price_rule_id: Option<PriceRuleId>,
}

/// Aggregated deal activity for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopProduct {
    pub product_id: i64,
    /// Title stored when the product joined a campaign.
    pub title: String,
    pub deals: i64,
    pub discount: i64,
    pub gmv: i64,
}
