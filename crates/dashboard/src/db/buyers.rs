//! Buyer repository.
//!
//! One row per device, store and product. Recording the same shopper twice
//! for a product is a conflict.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slaash_core::{CampaignProductId, StoreId};

use super::{RepositoryError, conflict_on_unique, timed};
use crate::models::Buyer;
use crate::models::buyer::NewBuyer;

const BUYER_COLUMNS: &str =
    r#"anonymousid, email, storeid, productid, "timestamp", gotdeal, clickeddeal, cpid, misc"#;

#[derive(Debug, sqlx::FromRow)]
struct BuyerRow {
    anonymousid: String,
    email: Option<String>,
    storeid: i32,
    productid: i64,
    timestamp: DateTime<Utc>,
    gotdeal: bool,
    clickeddeal: bool,
    cpid: Option<i32>,
    misc: Option<String>,
}

impl From<BuyerRow> for Buyer {
    fn from(row: BuyerRow) -> Self {
        Self {
            anonymous_id: row.anonymousid,
            email: row.email,
            store_id: StoreId::new(row.storeid),
            product_id: row.productid,
            seen_at: row.timestamp,
            got_deal: row.gotdeal,
            clicked_deal: row.clickeddeal,
            campaign_product_id: row.cpid.map(CampaignProductId::new),
            misc: row.misc,
        }
    }
}

/// Repository for buyers.
pub struct BuyerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BuyerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a buyer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the shopper is already
    /// recorded for this product, `Database` or `Timeout` otherwise.
    pub async fn create(&self, buyer: &NewBuyer) -> Result<Buyer, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO buyer (anonymousid, email, storeid, productid, gotdeal, clickeddeal, cpid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BUYER_COLUMNS}
            "
        );
        let row = timed(
            sqlx::query_as::<_, BuyerRow>(&sql)
                .bind(&buyer.anonymous_id)
                .bind(&buyer.email)
                .bind(buyer.store_id)
                .bind(buyer.product_id)
                .bind(buyer.got_deal)
                .bind(buyer.clicked_deal)
                .bind(buyer.campaign_product_id)
                .fetch_one(self.pool),
        )
        .await
        .map_err(|e| conflict_on_unique(e, "buyer"))?;

        Ok(row.into())
    }

    /// Buyers of a store, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Buyer>, RepositoryError> {
        let sql = format!(
            r#"SELECT {BUYER_COLUMNS} FROM buyer WHERE storeid = $1 ORDER BY "timestamp" DESC, anonymousid"#
        );
        let rows = timed(
            sqlx::query_as::<_, BuyerRow>(&sql)
                .bind(store_id)
                .fetch_all(self.pool),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
