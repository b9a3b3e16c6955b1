//! Buyers recorded for a store.
//!
//! # Environment Variables
//!
//! - `SLAASH_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use slaash_core::{CampaignProductId, Email};
use slaash_dashboard::db::{BuyerRepository, RepositoryError};
use slaash_dashboard::models::buyer::NewBuyer;
use thiserror::Error;

use super::{DatabaseSetupError, connect, print, resolve_store};
use crate::BuyerAction;

#[derive(Debug, Error)]
pub enum BuyerError {
    #[error(transparent)]
    Setup(#[from] DatabaseSetupError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Anonymous id must not be empty")]
    MissingAnonymousId,

    #[error("Could not format output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Run one buyer action for the store named by `store`.
pub async fn run(store: &str, action: BuyerAction) -> Result<(), BuyerError> {
    let pool = connect().await?;
    let store = resolve_store(&pool, store).await?;
    let buyers = BuyerRepository::new(&pool);

    match action {
        BuyerAction::List => print(&buyers.list_by_store(store.id).await?),
        BuyerAction::Record {
            anonymous_id,
            product_id,
            email,
            got_deal,
            clicked_deal,
            campaign_product,
        } => {
            let anonymous_id = anonymous_id.trim().to_string();
            if anonymous_id.is_empty() {
                return Err(BuyerError::MissingAnonymousId);
            }
            let email = email
                .map(|e| {
                    Email::parse(&e)
                        .map(|e| e.as_str().to_string())
                        .map_err(|err| BuyerError::InvalidEmail(err.to_string()))
                })
                .transpose()?;

            let buyer = buyers
                .create(&NewBuyer {
                    anonymous_id,
                    email,
                    store_id: store.id,
                    product_id,
                    got_deal,
                    clicked_deal,
                    campaign_product_id: campaign_product.map(CampaignProductId::new),
                })
                .await?;
            print(&buyer)
        }
    }
}
