//! JSON API behind the dashboard frontend.
//!
//! Every handler requires a logged-in user ([`RequireUser`]) and works on
//! that user's store. Field names in responses are `PascalCase`.
//!
//! [`RequireUser`]: crate::middleware::RequireUser

pub mod activity;
pub mod campaigns;
pub mod deal_list;
pub mod discounts;
pub mod profile;

use axum::Router;
use axum::routing::{get, post};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::models::Store;
use crate::shopify::StoreClient;
use crate::state::AppState;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .route("/toggle_deal_list", get(deal_list::toggle_deal_list))
        .route("/get_dl_info", get(deal_list::get_dl_info))
        .route("/config_dl", post(deal_list::config_dl))
        .route("/turn_off_next_campaign", get(campaigns::turn_off_next_campaign))
        .route("/campaign_activity", get(campaigns::campaign_activity))
        .route("/trending_products", get(campaigns::trending_products))
        .route("/past_campaigns", get(campaigns::past_campaigns))
        .route("/deallist_activity", get(activity::deallist_activity))
        .route("/otf_visitors", get(activity::otf_visitors))
        .route("/if_otf", get(activity::if_otf))
        .route("/discounts", get(discounts::list_discounts))
        .route(
            "/config_discount_defaults",
            get(discounts::config_discount_defaults),
        )
        .route("/config_discounts", post(discounts::config_discounts))
        .route("/get_user_profile", get(profile::get_user_profile))
        .route("/update_profile", post(profile::update_profile))
        .route("/update_password", post(profile::update_password));

    Router::new().nest("/api", api)
}

/// Shopify client for the store's offline token.
pub(crate) fn store_client(state: &AppState, store: &Store) -> Result<StoreClient, AppError> {
    let token = store
        .api_token
        .clone()
        .ok_or_else(|| AppError::Forbidden("store is not connected to Shopify".to_string()))?;
    Ok(state.shopify().store(&store.url, token))
}

/// Log a failed aggregate and carry on with zeros.
pub(crate) fn or_zero<T: Default>(result: Result<T, RepositoryError>, metric: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, metric, "aggregate query failed, reporting zero");
        T::default()
    })
}
