//! Campaign management for a store.
//!
//! Campaigns are normally scheduled by the storefront service; these
//! commands create and inspect them by hand. Results are printed as pretty
//! JSON.
//!
//! # Environment Variables
//!
//! - `SLAASH_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use chrono::{DateTime, Duration, Utc};
use slaash_core::{CampaignId, CampaignStatus, PriceRuleId, StoreId};
use slaash_dashboard::db::{CampaignRepository, RepositoryError};
use slaash_dashboard::models::campaign::NewCampaignProduct;
use thiserror::Error;

use super::{DatabaseSetupError, connect, print, resolve_store};
use crate::CampaignAction;

/// Longest campaign the CLI will schedule.
const MAX_CAMPAIGN_DAYS: i64 = 90;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error(transparent)]
    Setup(#[from] DatabaseSetupError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Discount must be between 1 and 100, got {0}")]
    InvalidDiscount(i32),

    #[error("Campaign length must be between 1 and {MAX_CAMPAIGN_DAYS} days, got {0}")]
    InvalidLength(i64),

    #[error("Price must not be negative, got {0}")]
    InvalidPrice(i64),

    #[error("Campaign {0} does not belong to this store")]
    UnknownCampaign(i32),

    #[error("Could not format output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Run one campaign action for the store named by `store`.
pub async fn run(store: &str, action: CampaignAction) -> Result<(), CampaignError> {
    let pool = connect().await?;
    let store = resolve_store(&pool, store).await?;
    let campaigns = CampaignRepository::new(&pool);

    match action {
        CampaignAction::List => print(&campaigns.list_by_store(store.id).await?),
        CampaignAction::Create {
            discount,
            days,
            active,
        } => {
            validate_discount(discount)?;
            let (starts_at, ends_at) = campaign_window(Utc::now(), days)?;
            let status = if active {
                CampaignStatus::Active
            } else {
                CampaignStatus::Inactive
            };

            let campaign = campaigns
                .create(store.id, starts_at, ends_at, discount, status)
                .await?;
            tracing::info!(campaign_id = %campaign.id, store_id = %store.id, "campaign created");
            print(&campaign)
        }
        CampaignAction::AddProduct {
            campaign_id,
            product_id,
            title,
            discount,
            price,
            price_rule,
        } => {
            validate_discount(discount)?;
            if price < 0 {
                return Err(CampaignError::InvalidPrice(price));
            }
            let campaign_id = owned_campaign(&campaigns, store.id, campaign_id).await?;

            let id = campaigns
                .add_product(&NewCampaignProduct {
                    campaign_id,
                    store_id: store.id,
                    product_id,
                    title,
                    deal_discount: discount,
                    price,
                    price_rule_id: price_rule.map(PriceRuleId::new),
                })
                .await?;
            tracing::info!(campaign_product_id = %id, %campaign_id, "product added to campaign");
            Ok(())
        }
        CampaignAction::Products { campaign_id } => {
            let campaign_id = owned_campaign(&campaigns, store.id, campaign_id).await?;
            print(&campaigns.products(campaign_id).await?)
        }
    }
}

/// Check that a campaign belongs to the store before touching it.
async fn owned_campaign(
    campaigns: &CampaignRepository<'_>,
    store_id: StoreId,
    campaign_id: i32,
) -> Result<CampaignId, CampaignError> {
    let id = CampaignId::new(campaign_id);
    campaigns
        .list_by_store(store_id)
        .await?
        .iter()
        .any(|c| c.id == id)
        .then_some(id)
        .ok_or(CampaignError::UnknownCampaign(campaign_id))
}

fn validate_discount(discount: i32) -> Result<(), CampaignError> {
    if discount < 1 || discount > 100 {
        return Err(CampaignError::InvalidDiscount(discount));
    }
    Ok(())
}

fn campaign_window(
    now: DateTime<Utc>,
    days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), CampaignError> {
    if !(1..=MAX_CAMPAIGN_DAYS).contains(&days) {
        return Err(CampaignError::InvalidLength(days));
    }
    Ok((now, now + Duration::days(days)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_bounds() {
        assert!(validate_discount(1).is_ok());
        assert!(validate_discount(100).is_ok());
        assert!(matches!(
            validate_discount(0),
            Err(CampaignError::InvalidDiscount(0))
        ));
        assert!(validate_discount(101).is_err());
    }

    #[test]
    fn test_campaign_window() {
        let now = Utc::now();
        let (starts_at, ends_at) = campaign_window(now, 7).unwrap();
        assert_eq!(starts_at, now);
        assert_eq!(ends_at - starts_at, Duration::days(7));

        assert!(matches!(
            campaign_window(now, 0),
            Err(CampaignError::InvalidLength(0))
        ));
        assert!(campaign_window(now, MAX_CAMPAIGN_DAYS + 1).is_err());
    }
}
