//! Checkout and visitor aggregates behind the analytics endpoints.
//!
//! Ranges are half-open (`createdat >= start AND createdat < end`). Hourly
//! series are bucketed in UTC by the database and returned as sparse points;
//! [`slaash_core::HourlySeries`] fills the gaps.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use slaash_core::StoreId;
use slaash_core::analytics::TimeRange;

use super::{RepositoryError, timed};

/// GMV and discount totals for a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct CheckoutTotals {
    pub gmv: i64,
    pub discount: i64,
}

/// Distinct deal takers and products for a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct VisitorTotals {
    pub users: i64,
    pub products: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutHourRow {
    hour: DateTime<Utc>,
    gmv: i64,
    discount: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct VisitorHourRow {
    hour: DateTime<Utc>,
    users: i64,
    products: i64,
}

/// Sparse hourly points for checkout money.
#[derive(Debug, Default)]
pub struct CheckoutSeries {
    pub gmv: Vec<(DateTime<Utc>, i64)>,
    pub discount: Vec<(DateTime<Utc>, i64)>,
}

/// Sparse hourly points for deal takers.
#[derive(Debug, Default)]
pub struct VisitorSeries {
    pub users: Vec<(DateTime<Utc>, i64)>,
    pub products: Vec<(DateTime<Utc>, i64)>,
}

/// Repository for checkout and visitor activity.
pub struct ActivityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn checkout_totals(
        &self,
        store_id: StoreId,
        range: &TimeRange,
    ) -> Result<CheckoutTotals, RepositoryError> {
        timed(
            sqlx::query_as::<_, CheckoutTotals>(
                r"
                SELECT COALESCE(SUM(gmv), 0)::BIGINT AS gmv,
                       COALESCE(SUM(discount), 0)::BIGINT AS discount
                  FROM checkout
                 WHERE storeid = $1 AND createdat >= $2 AND createdat < $3
                ",
            )
            .bind(store_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(self.pool),
        )
        .await
    }

    /// Count distinct visitors and distinct products that received a deal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn visitor_totals(
        &self,
        store_id: StoreId,
        range: &TimeRange,
    ) -> Result<VisitorTotals, RepositoryError> {
        timed(
            sqlx::query_as::<_, VisitorTotals>(
                r"
                SELECT COUNT(DISTINCT anonymousid) FILTER (WHERE gotdeal) AS users,
                       COUNT(DISTINCT productid) FILTER (WHERE gotdeal) AS products
                  FROM visitor
                 WHERE storeid = $1 AND createdat >= $2 AND createdat < $3
                ",
            )
            .bind(store_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(self.pool),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn checkout_series(
        &self,
        store_id: StoreId,
        range: &TimeRange,
    ) -> Result<CheckoutSeries, RepositoryError> {
        let rows = timed(
            sqlx::query_as::<_, CheckoutHourRow>(
                r"
                SELECT date_trunc('hour', createdat AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS hour,
                       SUM(gmv)::BIGINT AS gmv,
                       SUM(discount)::BIGINT AS discount
                  FROM checkout
                 WHERE storeid = $1 AND createdat >= $2 AND createdat < $3
                 GROUP BY 1
                 ORDER BY 1
                ",
            )
            .bind(store_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(self.pool),
        )
        .await?;

        let mut series = CheckoutSeries::default();
        for row in rows {
            series.gmv.push((row.hour, row.gmv));
            series.discount.push((row.hour, row.discount));
        }
        Ok(series)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn visitor_series(
        &self,
        store_id: StoreId,
        range: &TimeRange,
    ) -> Result<VisitorSeries, RepositoryError> {
        let rows = timed(
            sqlx::query_as::<_, VisitorHourRow>(
                r"
                SELECT date_trunc('hour', createdat AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS hour,
                       COUNT(DISTINCT anonymousid) FILTER (WHERE gotdeal) AS users,
                       COUNT(DISTINCT productid) FILTER (WHERE gotdeal) AS products
                  FROM visitor
                 WHERE storeid = $1 AND createdat >= $2 AND createdat < $3
                 GROUP BY 1
                 ORDER BY 1
                ",
            )
            .bind(store_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(self.pool),
        )
        .await?;

        let mut series = VisitorSeries::default();
        for row in rows {
            series.users.push((row.hour, row.users));
            series.products.push((row.hour, row.products));
        }
        Ok(series)
    }

    /// Distinct visitors flagged as on-the-fly shoppers, per hour.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn otf_series(
        &self,
        store_id: StoreId,
        range: &TimeRange,
    ) -> Result<Vec<(DateTime<Utc>, i64)>, RepositoryError> {
        timed(
            sqlx::query_as::<_, (DateTime<Utc>, i64)>(
                r"
                SELECT date_trunc('hour', createdat AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS hour,
                       COUNT(DISTINCT anonymousid) AS visitors
                  FROM visitor
                 WHERE storeid = $1 AND isotf AND createdat >= $2 AND createdat < $3
                 GROUP BY 1
                 ORDER BY 1
                ",
            )
            .bind(store_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(self.pool),
        )
        .await
    }

    /// Record the OTF verdict for a visitor.
    ///
    /// Updates every visitor row of the anonymous id within the store; when
    /// the visitor has no row yet, one is inserted so the verdict is kept.
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn record_otf(
        &self,
        store_id: StoreId,
        anonymous_id: &str,
        is_otf: bool,
    ) -> Result<u64, RepositoryError> {
        let updated = timed(
            sqlx::query("UPDATE visitor SET isotf = $3 WHERE storeid = $1 AND anonymousid = $2")
                .bind(store_id)
                .bind(anonymous_id)
                .bind(is_otf)
                .execute(self.pool),
        )
        .await?
        .rows_affected();

        if updated > 0 {
            return Ok(updated);
        }

        let inserted = timed(
            sqlx::query(
                "INSERT INTO visitor (storeid, anonymousid, gotdeal, isotf) VALUES ($1, $2, FALSE, $3)",
            )
            .bind(store_id)
            .bind(anonymous_id)
            .bind(is_otf)
            .execute(self.pool),
        )
        .await?
        .rows_affected();

        Ok(inserted)
    }
}
