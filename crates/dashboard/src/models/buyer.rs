//! Shoppers seen on a product page.

use chrono::{DateTime, Utc};
use serde::Serialize;

use slaash_core::{CampaignProductId, StoreId};

/// A shopper's interaction with one product of a store.
#[derive(Debug, Clone, Serialize)]
pub struct Buyer {
    /// Storefront device id.
    pub anonymous_id: String,
    pub email: Option<String>,
    pub store_id: StoreId,
    /// Shopify product id.
    pub product_id: i64,
    pub seen_at: DateTime<Utc>,
    pub got_deal: bool,
    pub clicked_deal: bool,
    /// Campaign product the deal came from.
    pub campaign_product_id: Option<CampaignProductId>,
    pub misc: Option<String>,
}

/// Fields needed to record a buyer.
#[derive(Debug, Clone)]
pub struct NewBuyer {
    pub anonymous_id: String,
    pub email: Option<String>,
    pub store_id: StoreId,
    pub product_id: i64,
    pub got_deal: bool,
    pub clicked_deal: bool,
    pub campaign_product_id: Option<CampaignProductId>,
}
