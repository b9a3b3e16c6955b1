//! Deal-list popup settings.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use slaash_core::DealListPosition;

use super::store_client;
use crate::db::StoreRepository;
use crate::error::{AppError, AppJson};
use crate::middleware::RequireUser;
use crate::models::DealListSettings;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ToggleResponse {
    pub deal_list_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealListInfo {
    pub active: bool,
    pub title: String,
    pub body: String,
    pub delay_seconds: i32,
    pub position: DealListPosition,
}

impl From<DealListSettings> for DealListInfo {
    fn from(settings: DealListSettings) -> Self {
        Self {
            active: settings.active,
            title: settings.title,
            body: settings.body,
            delay_seconds: settings.delay_seconds,
            position: settings.position,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigDealListResponse {
    pub deal_list: DealListInfo,
    /// Whether the storefront config asset was updated on the main theme.
    pub asset_synced: bool,
}

/// GET /api/toggle_deal_list
#[instrument(skip(state, user), fields(store_id = %user.store_id))]
pub async fn toggle_deal_list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ToggleResponse>, AppError> {
    let active = StoreRepository::new(state.pool())
        .toggle_deal_list(user.store_id)
        .await?;

    tracing::info!(active, "deal list toggled");
    Ok(Json(ToggleResponse {
        deal_list_active: active,
    }))
}

/// GET /api/get_dl_info
pub async fn get_dl_info(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<DealListInfo>, AppError> {
    let store = StoreRepository::new(state.pool())
        .require(user.store_id)
        .await?;
    Ok(Json(store.deal_list.into()))
}

/// POST /api/config_dl
///
/// Saves the settings, then pushes them to the published theme. A failed
/// push does not fail the request.
#[instrument(skip(state, user, settings), fields(store_id = %user.store_id))]
pub async fn config_dl(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    AppJson(settings): AppJson<DealListSettings>,
) -> Result<Json<ConfigDealListResponse>, AppError> {
    settings.validate().map_err(AppError::BadRequest)?;

    let stores = StoreRepository::new(state.pool());
    stores.update_deal_list(user.store_id, &settings).await?;
    let store = stores.require(user.store_id).await?;

    let asset_synced = match store_client(&state, &store) {
        Ok(client) => match client.push_deal_list_config(&settings).await {
            Ok(asset) => {
                tracing::info!(key = %asset.key, "deal list config pushed to theme");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to push deal list config to theme");
                false
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "skipping theme push");
            false
        }
    };

    Ok(Json(ConfigDealListResponse {
        deal_list: settings.into(),
        asset_synced,
    }))
}
