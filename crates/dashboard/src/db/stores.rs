//! Store repository.
//!
//! The store row carries the shop's offline token and every merchant-level
//! setting the dashboard edits (deal list, default discount, campaign pause).

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use slaash_core::{DiscountCategory, StoreId};

use super::{RepositoryError, timed};
use crate::models::{DealListSettings, Store};

const STORE_COLUMNS: &str = "id, name, url, apitoken, currency, deal_list_active, deal_list_title, \
     deal_list_body, deal_list_delay_seconds, deal_list_position, campaign_turn_off_at, \
     default_discount, discount_category, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    url: String,
    apitoken: Option<String>,
    currency: String,
    deal_list_active: bool,
    deal_list_title: String,
    deal_list_body: String,
    deal_list_delay_seconds: i32,
    deal_list_position: String,
    campaign_turn_off_at: Option<DateTime<Utc>>,
    default_discount: Option<i32>,
    discount_category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let position = row.deal_list_position.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("store {}: {e}", row.id))
        })?;
        let discount_category = row.discount_category.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("store {}: {e}", row.id))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            url: row.url,
            api_token: row.apitoken.map(SecretString::from),
            currency: row.currency,
            deal_list: DealListSettings {
                active: row.deal_list_active,
                title: row.deal_list_title,
                body: row.deal_list_body,
                delay_seconds: row.deal_list_delay_seconds,
                position,
            },
            campaign_turn_off_at: row.campaign_turn_off_at,
            default_discount: row.default_discount,
            discount_category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for store rows.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a store by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails,
    /// `DataCorruption` if a stored enum column is invalid.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM store WHERE id = $1");
        let row = timed(
            sqlx::query_as::<_, StoreRow>(&sql)
                .bind(id)
                .fetch_optional(self.pool),
        )
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a store by id, treating a missing row as an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when the store does not exist.
    pub async fn require(&self, id: StoreId) -> Result<Store, RepositoryError> {
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Get a store by its shop domain.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM store WHERE url = $1");
        let row = timed(
            sqlx::query_as::<_, StoreRow>(&sql)
                .bind(url)
                .fetch_optional(self.pool),
        )
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or refresh a store after a successful OAuth install.
    ///
    /// The token is replaced on every install so a reinstall recovers a
    /// revoked token. Merchant settings are left untouched on conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` or `Timeout` if the query fails.
    pub async fn upsert_installed(
        &self,
        name: &str,
        url: &str,
        api_token: &str,
        currency: &str,
    ) -> Result<Store, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO store (name, url, apitoken, currency)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (url) DO UPDATE
               SET name = EXCLUDED.name,
                   apitoken = EXCLUDED.apitoken,
                   currency = EXCLUDED.currency,
                   updated_at = NOW()
            RETURNING {STORE_COLUMNS}
            "
        );
        let row = timed(
            sqlx::query_as::<_, StoreRow>(&sql)
                .bind(name)
                .bind(url)
                .bind(api_token)
                .bind(currency)
                .fetch_one(self.pool),
        )
        .await?;

        row.try_into()
    }

    /// Flip the deal-list switch and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn toggle_deal_list(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let active: Option<bool> = timed(
            sqlx::query_scalar(
                r"
                UPDATE store
                   SET deal_list_active = NOT deal_list_active, updated_at = NOW()
                 WHERE id = $1
                RETURNING deal_list_active
                ",
            )
            .bind(id)
            .fetch_optional(self.pool),
        )
        .await?;

        active.ok_or(RepositoryError::NotFound)
    }

    /// Pause campaign scheduling until `at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn set_campaign_turn_off(
        &self,
        id: StoreId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = timed(
            sqlx::query(
                "UPDATE store SET campaign_turn_off_at = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(at)
            .execute(self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Save the store's default deal discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn update_discount_defaults(
        &self,
        id: StoreId,
        value: i32,
        category: DiscountCategory,
    ) -> Result<(), RepositoryError> {
        let result = timed(
            sqlx::query(
                r"
                UPDATE store
                   SET default_discount = $2, discount_category = $3, updated_at = NOW()
                 WHERE id = $1
                ",
            )
            .bind(id)
            .bind(value)
            .bind(category.as_str())
            .execute(self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Save the deal-list popup settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn update_deal_list(
        &self,
        id: StoreId,
        settings: &DealListSettings,
    ) -> Result<(), RepositoryError> {
        let result = timed(
            sqlx::query(
                r"
                UPDATE store
                   SET deal_list_active = $2,
                       deal_list_title = $3,
                       deal_list_body = $4,
                       deal_list_delay_seconds = $5,
                       deal_list_position = $6,
                       updated_at = NOW()
                 WHERE id = $1
                ",
            )
            .bind(id)
            .bind(settings.active)
            .bind(&settings.title)
            .bind(&settings.body)
            .bind(settings.delay_seconds)
            .bind(settings.position.as_str())
            .execute(self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
