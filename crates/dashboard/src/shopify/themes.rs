//! Theme lookup and asset upload.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Asset, ShopifyError, StoreClient, Theme};
use crate::models::DealListSettings;

/// Storefront script that loads the Slaash widget.
pub const GLOBAL_SCRIPT_ASSET_KEY: &str = "assets/global-slaash.js";

/// Deal-list configuration read by the storefront script.
pub const DEAL_LIST_ASSET_KEY: &str = "assets/slaash-config.js";

#[derive(Deserialize)]
struct ThemesEnvelope {
    themes: Vec<Theme>,
}

#[derive(Serialize, Deserialize)]
struct AssetEnvelope {
    asset: Asset,
}

impl StoreClient {
    /// List installed themes.
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn list_themes(&self) -> Result<Vec<Theme>, ShopifyError> {
        let envelope: ThemesEnvelope = self.get("/themes.json", &[]).await?;
        Ok(envelope.themes)
    }

    /// The published theme.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NoMainTheme` if no theme has the `main` role.
    pub async fn main_theme(&self) -> Result<Theme, ShopifyError> {
        self.list_themes()
            .await?
            .into_iter()
            .find(Theme::is_main)
            .ok_or(ShopifyError::NoMainTheme)
    }

    /// Create or replace an asset on a theme.
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    #[instrument(skip(self, value), fields(shop = %self.shop()))]
    pub async fn put_asset(
        &self,
        theme_id: i64,
        key: &str,
        value: String,
    ) -> Result<Asset, ShopifyError> {
        let body = AssetEnvelope {
            asset: Asset {
                key: key.to_string(),
                value: Some(value),
                public_url: None,
                updated_at: None,
            },
        };
        let envelope: AssetEnvelope = self
            .put(&format!("/themes/{theme_id}/assets.json"), &body)
            .await?;
        Ok(envelope.asset)
    }

    /// Upload the widget loader script to the published theme.
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if there is no main theme or the upload fails.
    pub async fn push_global_script(&self, script: String) -> Result<Asset, ShopifyError> {
        let theme = self.main_theme().await?;
        self.put_asset(theme.id, GLOBAL_SCRIPT_ASSET_KEY, script)
            .await
    }

    /// Upload the deal-list configuration to the published theme.
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if there is no main theme or the upload fails.
    pub async fn push_deal_list_config(
        &self,
        settings: &DealListSettings,
    ) -> Result<Asset, ShopifyError> {
        let theme = self.main_theme().await?;
        self.put_asset(theme.id, DEAL_LIST_ASSET_KEY, settings.to_script())
            .await
    }
}
