//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::clickstream::ClickstreamClient;
use crate::config::DashboardConfig;
use crate::services::otf::{AlwaysOtf, OtfScorer};
use crate::shopify::{ShopifyClient, ShopifyError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    pool: PgPool,
    shopify: ShopifyClient,
    clickstream: ClickstreamClient,
    otf: Arc<dyn OtfScorer>,
}

impl AppState {
    /// Create a new application state with the default OTF scorer.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify HTTP client cannot be built.
    pub fn new(config: DashboardConfig, pool: PgPool) -> Result<Self, ShopifyError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        let clickstream = ClickstreamClient::new(&config.clickhouse);
        Ok(Self::from_parts(
            config,
            pool,
            shopify,
            clickstream,
            Arc::new(AlwaysOtf),
        ))
    }

    /// Assemble state from pre-built clients.
    #[must_use]
    pub fn from_parts(
        config: DashboardConfig,
        pool: PgPool,
        shopify: ShopifyClient,
        clickstream: ClickstreamClient,
        otf: Arc<dyn OtfScorer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                clickstream,
                otf,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the app-level Shopify client.
    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn clickstream(&self) -> &ClickstreamClient {
        &self.inner.clickstream
    }

    #[must_use]
    pub fn otf(&self) -> &dyn OtfScorer {
        self.inner.otf.as_ref()
    }
}
