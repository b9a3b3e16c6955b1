//! Campaign and campaign product repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slaash_core::{CampaignId, CampaignProductId, CampaignStatus, PriceRuleId, StoreId};

use super::{RepositoryError, timed};
use crate::models::campaign::NewCampaignProduct;
use crate::models::{Campaign, CampaignProduct, TopProduct};

const CAMPAIGN_COLUMNS: &str =
    r#"campaignid, storeid, "timestamp", endsat, discount, activestatus, misc"#;

#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    campaignid: i32,
    storeid: i32,
    timestamp: DateTime<Utc>,
    endsat: DateTime<Utc>,
    discount: i32,
    activestatus: CampaignStatus,
    misc: Option<String>,
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Self {
        Self {
            id: CampaignId::new(row.campaignid),
            store_id: StoreId::new(row.storeid),
            starts_at: row.timestamp,
            ends_at: row.endsat,
            discount: row.discount,
            status: row.activestatus,
            misc: row.misc,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CampaignProductRow {
    id: i32,
    campaignid: i32,
    storeid: i32,
    productid: i64,
    title: String,
    deals: i32,
    sold: i32,
    dealdiscount: i32,
    emailsentto: Vec<String>,
    priceruleid: Option<i32>,
    price: i64,
    timestamp: DateTime<Utc>,
}

impl From<CampaignProductRow> for CampaignProduct {
    fn from(row: CampaignProductRow) -> Self {
        Self {
            id: CampaignProductId::new(row.id),
            campaign_id: CampaignId::new(row.campaignid),
            store_id: StoreId::new(row.storeid),
            product_id: row.productid,
            title: row.title,
            deals: row.deals,
            sold: row.sold,
            deal_discount: row.dealdiscount,
            email_sent_to: row.emailsentto,
            price_rule_id: row.priceruleid.map(PriceRuleId::new),
            price: row.price,
            created_at: row.timestamp,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TopProductRow {
    productid: i64,
    title: String,
    deals: i64,
    discount: i64,
    gmv: i64,
}

/// Repository for campaigns.
pub struct CampaignRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CampaignRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The most recently started active campaign of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn latest_active(
        &self,
        store_id: StoreId,
    ) -> Result<Option<Campaign>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {CAMPAIGN_COLUMNS}
              FROM campaign
             WHERE storeid = $1 AND activestatus = $2
             ORDER BY "timestamp" DESC
             LIMIT 1
            "#
        );
        let row = timed(
            sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(store_id)
                .bind(CampaignStatus::Active)
                .fetch_optional(self.pool),
        )
        .await?;

        Ok(row.map(Into::into))
    }

    /// All campaigns of a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Campaign>, RepositoryError> {
        let sql = format!(
            r#"SELECT {CAMPAIGN_COLUMNS} FROM campaign WHERE storeid = $1 ORDER BY "timestamp" DESC"#
        );
        let rows = timed(
            sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(store_id)
                .fetch_all(self.pool),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a campaign.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        discount: i32,
        status: CampaignStatus,
    ) -> Result<Campaign, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO campaign (storeid, "timestamp", endsat, discount, activestatus)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CAMPAIGN_COLUMNS}
            "#
        );
        let row = timed(
            sqlx::query_as::<_, CampaignRow>(&sql)
                .bind(store_id)
                .bind(starts_at)
                .bind(ends_at)
                .bind(discount)
                .bind(status)
                .fetch_one(self.pool),
        )
        .await?;

        Ok(row.into())
    }

    /// Add a product to a campaign.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn add_product(
        &self,
        product: &NewCampaignProduct,
    ) -> Result<CampaignProductId, RepositoryError> {
        let id: i32 = timed(
            sqlx::query_scalar(
                r"
                INSERT INTO campaign_product
                    (campaignid, storeid, productid, title, dealdiscount, price, priceruleid)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                ",
            )
            .bind(product.campaign_id)
            .bind(product.store_id)
            .bind(product.product_id)
            .bind(&product.title)
            .bind(product.deal_discount)
            .bind(product.price)
            .bind(product.price_rule_id)
            .fetch_one(self.pool),
        )
        .await?;

        Ok(CampaignProductId::new(id))
    }

    /// Products of a campaign.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn products(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CampaignProduct>, RepositoryError> {
        let rows = timed(
            sqlx::query_as::<_, CampaignProductRow>(
                r#"
                SELECT id, campaignid, storeid, productid, title, deals, sold, dealdiscount,
                       emailsentto, priceruleid, price, "timestamp"
                  FROM campaign_product
                 WHERE campaignid = $1
                 ORDER BY id
                "#,
            )
            .bind(campaign_id)
            .fetch_all(self.pool),
        )
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Products with the most deals handed out, joined with checkout totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn top_products(
        &self,
        store_id: StoreId,
        limit: i64,
    ) -> Result<Vec<TopProduct>, RepositoryError> {
        let rows = timed(
            sqlx::query_as::<_, TopProductRow>(
                r"
                SELECT cp.productid,
                       MAX(cp.title) AS title,
                       SUM(cp.deals)::BIGINT AS deals,
                       COALESCE(MAX(ck.discount), 0)::BIGINT AS discount,
                       COALESCE(MAX(ck.gmv), 0)::BIGINT AS gmv
                  FROM campaign_product cp
                  LEFT JOIN (
                        SELECT productid, SUM(discount) AS discount, SUM(gmv) AS gmv
                          FROM checkout
                         WHERE storeid = $1
                         GROUP BY productid
                  ) ck ON ck.productid = cp.productid
                 WHERE cp.storeid = $1
                 GROUP BY cp.productid
                 ORDER BY deals DESC, cp.productid
                 LIMIT $2
                ",
            )
            .bind(store_id)
            .bind(limit)
            .fetch_all(self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopProduct {
                product_id: r.productid,
                title: r.title,
                deals: r.deals,
                discount: r.discount,
                gmv: r.gmv,
            })
            .collect())
    }
}
