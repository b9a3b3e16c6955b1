//! Price rule and discount code mirror.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use slaash_core::{DiscountCodeId, PriceRuleId, StoreId};

use super::{RepositoryError, timed};
use crate::models::{DiscountCode, PriceRule};

const PRICE_RULE_COLUMNS: &str = "id, prid, storeid, title, targettype, targetselection, valuetype, \
     value, customerselection, allocationmethod, startsat";

const DISCOUNT_CODE_COLUMNS: &str = "id, priceruleid, shopifyid, code, usagecount, createdat, updatedat";

#[derive(Debug, sqlx::FromRow)]
struct PriceRuleRow {
    id: i32,
    prid: i64,
    storeid: i32,
    title: String,
    targettype: String,
    targetselection: String,
    valuetype: String,
    value: Decimal,
    customerselection: String,
    allocationmethod: String,
    startsat: DateTime<Utc>,
}

impl From<PriceRuleRow> for PriceRule {
    fn from(row: PriceRuleRow) -> Self {
        Self {
            id: PriceRuleId::new(row.id),
            shopify_id: row.prid,
            store_id: StoreId::new(row.storeid),
            title: row.title,
            target_type: row.targettype,
            target_selection: row.targetselection,
            value_type: row.valuetype,
            value: row.value,
            customer_selection: row.customerselection,
            allocation_method: row.allocationmethod,
            starts_at: row.startsat,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscountCodeRow {
    id: i32,
    priceruleid: i32,
    shopifyid: i64,
    code: String,
    usagecount: i32,
    createdat: DateTime<Utc>,
    updatedat: DateTime<Utc>,
}

impl From<DiscountCodeRow> for DiscountCode {
    fn from(row: DiscountCodeRow) -> Self {
        Self {
            id: DiscountCodeId::new(row.id),
            price_rule_id: PriceRuleId::new(row.priceruleid),
            shopify_id: row.shopifyid,
            code: row.code,
            usage_count: row.usagecount,
            created_at: row.createdat,
            updated_at: row.updatedat,
        }
    }
}

/// Fields of a price rule to mirror locally.
#[derive(Debug, Clone)]
pub struct NewPriceRule<'a> {
    pub shopify_id: i64,
    pub store_id: StoreId,
    pub title: &'a str,
    pub target_type: &'a str,
    pub target_selection: &'a str,
    pub value_type: &'a str,
    pub value: Decimal,
    pub customer_selection: &'a str,
    pub allocation_method: &'a str,
    pub starts_at: DateTime<Utc>,
}

/// Repository for mirrored discounts.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn create_price_rule(
        &self,
        rule: &NewPriceRule<'_>,
    ) -> Result<PriceRule, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO price_rule
                (prid, storeid, title, targettype, targetselection, valuetype,
                 value, customerselection, allocationmethod, startsat)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRICE_RULE_COLUMNS}
            "
        );
        let row = timed(
            sqlx::query_as::<_, PriceRuleRow>(&sql)
                .bind(rule.shopify_id)
                .bind(rule.store_id)
                .bind(rule.title)
                .bind(rule.target_type)
                .bind(rule.target_selection)
                .bind(rule.value_type)
                .bind(rule.value)
                .bind(rule.customer_selection)
                .bind(rule.allocation_method)
                .bind(rule.starts_at)
                .fetch_one(self.pool),
        )
        .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn create_discount_code(
        &self,
        price_rule_id: PriceRuleId,
        shopify_id: i64,
        code: &str,
    ) -> Result<DiscountCode, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO discount_code (priceruleid, shopifyid, code, usagecount)
            VALUES ($1, $2, $3, 0)
            RETURNING {DISCOUNT_CODE_COLUMNS}
            "
        );
        let row = timed(
            sqlx::query_as::<_, DiscountCodeRow>(&sql)
                .bind(price_rule_id)
                .bind(shopify_id)
                .bind(code)
                .fetch_one(self.pool),
        )
        .await?;

        Ok(row.into())
    }

    /// Price rules of a store, newest first, each with its codes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if a query fails.
    pub async fn list_with_codes(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<(PriceRule, Vec<DiscountCode>)>, RepositoryError> {
        let sql =
            format!("SELECT {PRICE_RULE_COLUMNS} FROM price_rule WHERE storeid = $1 ORDER BY startsat DESC, id DESC");
        let rules: Vec<PriceRule> = timed(
            sqlx::query_as::<_, PriceRuleRow>(&sql)
                .bind(store_id)
                .fetch_all(self.pool),
        )
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rules.iter().map(|r| r.id.as_i32()).collect();
        let sql = format!(
            "SELECT {DISCOUNT_CODE_COLUMNS} FROM discount_code WHERE priceruleid = ANY($1) ORDER BY id"
        );
        let codes: Vec<DiscountCode> = timed(
            sqlx::query_as::<_, DiscountCodeRow>(&sql)
                .bind(&ids)
                .fetch_all(self.pool),
        )
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

        Ok(group_codes(rules, codes))
    }
}

/// Attach codes to their price rule, keeping the rule order.
fn group_codes(
    rules: Vec<PriceRule>,
    mut codes: Vec<DiscountCode>,
) -> Vec<(PriceRule, Vec<DiscountCode>)> {
    rules
        .into_iter()
        .map(|rule| {
            let (own, rest): (Vec<_>, Vec<_>) =
                codes.drain(..).partition(|c| c.price_rule_id == rule.id);
            codes = rest;
            (rule, own)
        })
        .collect()
}
