//! Shopify Admin API tools for a connected store.
//!
//! The store's offline token is read from the dashboard database, so the
//! store must have completed the install flow first. Results are printed
//! as pretty JSON.
//!
//! # Environment Variables
//!
//! - `SLAASH_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SHOPIFY_CLIENT_ID`, `SHOPIFY_CLIENT_SECRET` - app credentials
//! - `SHOPIFY_API_VERSION` - Admin API version (optional)

use slaash_dashboard::config::{ConfigError, ShopifyConfig};
use slaash_dashboard::db::RepositoryError;
use slaash_dashboard::shopify::{ShopifyClient, ShopifyError, StoreClient, WebhookInput};
use thiserror::Error;

use super::{DatabaseSetupError, connect, print, resolve_store};
use crate::ShopAction;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error(transparent)]
    Setup(#[from] DatabaseSetupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Store {0} has no Shopify token; install the app first")]
    NotConnected(String),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("Could not read {0}: {1}")]
    Script(String, std::io::Error),

    #[error("Could not format output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Resolve the store's client and run one action against it.
///
/// `store` is a store id or a shop domain.
pub async fn run(store: &str, action: ShopAction) -> Result<(), ShopError> {
    let client = store_client(store).await?;
    tracing::info!(shop = %client.shop(), "Using store {store}");

    match action {
        ShopAction::Products { limit } => print(&client.list_products(limit).await?),
        ShopAction::Orders { limit } => print(&client.list_orders(limit).await?),
        ShopAction::Customers { limit } => print(&client.list_customers(limit).await?),
        ShopAction::CustomerOrders { customer_id } => {
            let customer = client.get_customer(customer_id).await?;
            tracing::info!(
                "Customer {}: {} orders",
                customer.id,
                customer.orders_count.unwrap_or_default()
            );
            print(&client.orders_for_customer(customer_id).await?)
        }
        ShopAction::AbandonedCheckouts { limit } => {
            print(&client.abandoned_checkouts(limit).await?)
        }
        ShopAction::PriceRules { limit } => print(&client.list_price_rules(limit).await?),
        ShopAction::DiscountCodes { price_rule_id } => {
            print(&client.list_discount_codes(price_rule_id).await?)
        }
        ShopAction::DeleteDiscountCode {
            price_rule_id,
            discount_code_id,
        } => {
            client
                .delete_discount_code(price_rule_id, discount_code_id)
                .await?;
            tracing::info!("Deleted discount code {discount_code_id}");
            Ok(())
        }
        ShopAction::Webhooks => print(&client.list_webhooks().await?),
        ShopAction::RegisterWebhook { topic, address } => {
            let webhook = client
                .create_webhook(&WebhookInput {
                    topic,
                    address,
                    format: "json".to_string(),
                })
                .await?;
            print(&webhook)
        }
        ShopAction::PushScript { path } => {
            let script = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ShopError::Script(path.display().to_string(), e))?;
            let asset = client.push_global_script(script).await?;
            tracing::info!(key = %asset.key, "Script uploaded to the published theme");
            Ok(())
        }
    }
}

async fn store_client(store_ref: &str) -> Result<StoreClient, ShopError> {
    let shopify = ShopifyClient::new(&ShopifyConfig::from_env()?)?;
    let pool = connect().await?;

    let store = resolve_store(&pool, store_ref).await?;
    let token = store
        .api_token
        .ok_or_else(|| ShopError::NotConnected(store_ref.to_string()))?;

    Ok(shopify.store(&store.url, token))
}
