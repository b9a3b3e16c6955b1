//! Shopify REST Admin API client.
//!
//! Two handles are used:
//!
//! - [`ShopifyClient`] holds the app credentials and drives the OAuth
//!   install (authorization URL and code exchange).
//! - [`StoreClient`] is bound to one installed shop and its offline token
//!   and wraps the REST resources the dashboard needs: shop info, theme
//!   assets, price rules and discount codes, orders, customers, abandoned
//!   checkouts, products and webhooks.
//!
//! # Example
//!
//! ```rust,ignore
//! use slaash_dashboard::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//! let token = client.exchange_code("acme.myshopify.com", &code).await?;
//! let store = client.store("acme.myshopify.com", token.access_token);
//! let shop = store.shop_info().await?;
//! ```

mod catalog;
mod discounts;
mod themes;
pub mod types;
mod webhooks;

pub use themes::{DEAL_LIST_ASSET_KEY, GLOBAL_SCRIPT_ASSET_KEY};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ShopifyConfig;

/// Largest page size the REST Admin API accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Token missing, revoked, or lacking a scope.
    #[error("Unauthorized: access token rejected")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// OAuth token exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The shop has no published (`main`) theme.
    #[error("no main theme found")]
    NoMainTheme,
}

/// Whether `shop` is a bare `*.myshopify.com` domain.
///
/// Only lowercase letters, digits and hyphens are allowed in the shop name,
/// which rules out paths, ports and look-alike hosts.
#[must_use]
pub fn is_valid_shop_domain(shop: &str) -> bool {
    let Some(name) = shop.strip_suffix(".myshopify.com") else {
        return false;
    };
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Offline access token returned by the OAuth exchange.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: SecretString,
    pub scope: String,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    scope: String,
}

/// App-level Shopify client.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    http: reqwest::Client,
    api_version: String,
    client_id: String,
    client_secret: SecretString,
    scopes: Vec<String>,
    /// Replaces `https://{shop}` for API calls (local stub servers).
    origin_override: Option<String>,
}

impl ShopifyClient {
    /// Create a client from the app configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Self::build(config, None)
    }

    /// Create a client that sends every API call to `origin` instead of the
    /// shop's own domain.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_origin(config: &ShopifyConfig, origin: &str) -> Result<Self, ShopifyError> {
        Self::build(config, Some(origin.trim_end_matches('/').to_string()))
    }

    fn build(config: &ShopifyConfig, origin_override: Option<String>) -> Result<Self, ShopifyError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("slaash-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                http,
                api_version: config.api_version.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                scopes: config.scopes.clone(),
                origin_override,
            }),
        })
    }

    /// Get the client secret (for HMAC verification).
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.inner.client_secret
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.inner.scopes
    }

    fn origin(&self, shop: &str) -> String {
        self.inner
            .origin_override
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Build the install/authorize URL the merchant is redirected to.
    #[must_use]
    pub fn authorization_url(&self, shop: &str, redirect_uri: &str, state: &str) -> String {
        let scope = self.inner.scopes.join(",");
        format!(
            "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify rejects the code and
    /// `ShopifyError::Http` if the request fails.
    pub async fn exchange_code(&self, shop: &str, code: &str) -> Result<AccessToken, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.origin(shop));
        let params = [
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.http.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "token exchange failed ({status}): {text}"
            )));
        }

        let token: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(format!("invalid token response: {e}")))?;

        Ok(AccessToken {
            access_token: SecretString::from(token.access_token),
            scope: token.scope,
        })
    }

    /// Bind the client to one installed shop.
    #[must_use]
    pub fn store(&self, shop: &str, access_token: SecretString) -> StoreClient {
        StoreClient {
            http: self.inner.http.clone(),
            base_url: format!("{}/admin/api/{}", self.origin(shop), self.inner.api_version),
            shop: shop.to_string(),
            access_token,
        }
    }
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("api_version", &self.inner.api_version)
            .field("client_id", &self.inner.client_id)
            .finish_non_exhaustive()
    }
}

/// REST client for one shop.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    shop: String,
    access_token: SecretString,
}

#[derive(Deserialize)]
struct ShopEnvelope {
    shop: ShopInfo,
}

impl StoreClient {
    /// The shop domain this client is bound to.
    #[must_use]
    pub fn shop(&self) -> &str {
        &self.shop
    }

    /// Fetch `shop.json` (name, owner email, currency).
    ///
    /// # Errors
    ///
    /// Returns a `ShopifyError` if the request fails.
    pub async fn shop_info(&self) -> Result<ShopInfo, ShopifyError> {
        let envelope: ShopEnvelope = self.get("/shop.json", &[]).await?;
        Ok(envelope.shop)
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<url::Url, ShopifyError> {
        let raw = format!("{}{path}", self.base_url);
        url::Url::parse_with_params(&raw, query)
            .map_err(|e| ShopifyError::Parse(format!("invalid request URL {raw}: {e}")))
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ShopifyError> {
        let url = self.url(path, query)?;
        let response = self
            .http
            .get(url)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request with a JSON body.
    pub(crate) async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ShopifyError> {
        let url = self.url(path, &[])?;
        let response = self
            .http
            .post(url)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a PUT request with a JSON body.
    pub(crate) async fn put<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ShopifyError> {
        let url = self.url(path, &[])?;
        let response = self
            .http
            .put(url)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ShopifyError> {
        let url = self.url(path, &[])?;
        let response = self
            .http
            .delete(url)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::parse_error(response).await)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShopifyError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| ShopifyError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse an error response from the Admin API.
    async fn parse_error(response: reqwest::Response) -> ShopifyError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(2, |secs| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let secs = secs.ceil().max(0.0) as u64;
                    secs
                });
            return ShopifyError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return ShopifyError::Unauthorized;
        }

        let url = response.url().path().to_string();
        if status == 404 {
            return ShopifyError::NotFound(url);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        ShopifyError::Api { status, message }
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("shop", &self.shop)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Clamp a requested page size to what the API accepts.
pub(crate) fn page_size(limit: u32) -> String {
    limit.clamp(1, MAX_PAGE_SIZE).to_string()
}
