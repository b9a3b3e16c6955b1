//! Clickstream reads from `ClickHouse`.
//!
//! The storefront script posts raw interaction events to a separate
//! collector which writes them to the `clickstream` table. The dashboard only
//! reads per-device aggregates from it to score on-the-fly (OTF) visitors.
//!
//! Events used here:
//! - `buttonClick` - a click on a tracked button
//! - `hoverIn` - the pointer rested on a product image or info block
//! - `avgClickDist` - rolling average distance between clicks (`event_data` is numeric)
//! - `scrollDepth` - scroll percentage of the page (`event_data` is numeric)

use clickhouse::{Client, Row};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClickhouseConfig;

/// Errors that can occur while reading the clickstream.
#[derive(Debug, Error)]
pub enum ClickstreamError {
    /// Query or transport failure.
    #[error("clickhouse error: {0}")]
    Query(#[from] clickhouse::error::Error),

    /// The query did not finish in time.
    #[error("clickhouse query timed out")]
    Timeout,
}

/// Per-device interaction aggregate used by the OTF scorer.
#[derive(Debug, Clone, Default, PartialEq, Row, Serialize, Deserialize)]
pub struct VisitTable {
    pub num_clicks: u64,
    pub num_hovers: u64,
    pub avg_click_dist: f64,
    pub max_scroll_depth: f64,
    pub page_count: u64,
    pub visit_count: u64,
}

const VISIT_TABLE_QUERY: &str = r"
SELECT
    countIf(event = 'buttonClick') AS num_clicks,
    countIf(event = 'hoverIn') AS num_hovers,
    ifNotFinite(avgIf(toFloat64OrZero(event_data), event = 'avgClickDist'), 0) AS avg_click_dist,
    ifNotFinite(maxIf(toFloat64OrZero(event_data), event = 'scrollDepth'), 0) AS max_scroll_depth,
    toUInt64(max(page_count)) AS page_count,
    toUInt64(max(visit_count)) AS visit_count
FROM clickstream
WHERE device_id = ?
";

/// Read-only client for the clickstream store.
#[derive(Clone)]
pub struct ClickstreamClient {
    client: Client,
}

impl ClickstreamClient {
    /// Build a client. No connection is made until the first query.
    #[must_use]
    pub fn new(config: &ClickhouseConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);
        if let Some(user) = &config.user {
            client = client.with_user(user);
        }
        if let Some(password) = &config.password {
            client = client.with_password(password.expose_secret());
        }
        Self { client }
    }

    /// Aggregate the clickstream of one device.
    ///
    /// A device with no events yields an all-zero [`VisitTable`].
    ///
    /// # Errors
    ///
    /// Returns `ClickstreamError::Query` if the query fails and
    /// `ClickstreamError::Timeout` after [`crate::db::QUERY_TIMEOUT`].
    pub async fn visit_table(&self, device_id: &str) -> Result<VisitTable, ClickstreamError> {
        let query = self
            .client
            .query(VISIT_TABLE_QUERY)
            .bind(device_id)
            .fetch_one::<VisitTable>();

        tokio::time::timeout(crate::db::QUERY_TIMEOUT, query)
            .await
            .map_err(|_| ClickstreamError::Timeout)?
            .map_err(ClickstreamError::from)
    }
}

impl std::fmt::Debug for ClickstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickstreamClient").finish_non_exhaustive()
    }
}
