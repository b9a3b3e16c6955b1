//! Repository tests against a real `PostgreSQL`.
//!
//! Each test creates its own store under a fresh shop domain, so the tests
//! can share one database and run in any order.
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p slaash-integration-tests --test repositories -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use slaash_core::analytics::TimeRange;
use slaash_core::{CampaignId, CampaignStatus, DiscountCategory, StoreId};
use slaash_dashboard::db::activity::{CheckoutTotals, VisitorTotals};
use slaash_dashboard::db::{
    ActivityRepository, BuyerRepository, CampaignRepository, RepositoryError, StoreRepository,
};
use slaash_dashboard::models::DealListSettings;
use slaash_dashboard::models::buyer::NewBuyer;
use slaash_dashboard::models::campaign::NewCampaignProduct;
use slaash_integration_tests::{create_store, test_pool, unique_shop};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn one_hour_from_noon() -> TimeRange {
    TimeRange {
        start: noon(),
        end: noon() + Duration::hours(1),
    }
}

async fn insert_checkout(pool: &PgPool, store_id: StoreId, product_id: i64, gmv: i64, discount: i64, at: DateTime<Utc>) {
    sqlx::query(
        "INSERT INTO checkout (storeid, anonymousid, productid, gmv, discount, createdat) \
         VALUES ($1, 'dev-checkout', $2, $3, $4, $5)",
    )
    .bind(store_id)
    .bind(product_id)
    .bind(gmv)
    .bind(discount)
    .bind(at)
    .execute(pool)
    .await
    .unwrap();
}

async fn insert_visitor(
    pool: &PgPool,
    store_id: StoreId,
    anonymous_id: &str,
    product_id: i64,
    got_deal: bool,
    at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO visitor (storeid, anonymousid, productid, gotdeal, createdat) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(store_id)
    .bind(anonymous_id)
    .bind(product_id)
    .bind(got_deal)
    .bind(at)
    .execute(pool)
    .await
    .unwrap();
}

async fn active_campaign(pool: &PgPool, store_id: StoreId) -> CampaignId {
    CampaignRepository::new(pool)
        .create(
            store_id,
            noon(),
            noon() + Duration::days(7),
            20,
            CampaignStatus::Active,
        )
        .await
        .unwrap()
        .id
}

fn campaign_product(campaign_id: CampaignId, store_id: StoreId, product_id: i64) -> NewCampaignProduct {
    NewCampaignProduct {
        campaign_id,
        store_id,
        product_id,
        title: format!("Product {product_id}"),
        deal_discount: 20,
        price: 2400,
        price_rule_id: None,
    }
}

// =============================================================================
// Activity
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_checkout_totals_are_half_open() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let range = one_hour_from_noon();

    insert_checkout(&pool, store_id, 1, 1000, 100, range.start).await;
    insert_checkout(&pool, store_id, 1, 500, 50, range.start + Duration::minutes(30)).await;
    insert_checkout(&pool, store_id, 1, 9000, 900, range.end).await;
    insert_checkout(&pool, store_id, 1, 7000, 700, range.start - Duration::seconds(1)).await;

    let totals = ActivityRepository::new(&pool)
        .checkout_totals(store_id, &range)
        .await
        .unwrap();
    assert_eq!(
        totals,
        CheckoutTotals {
            gmv: 1500,
            discount: 150
        }
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_checkout_totals_empty_range_is_zero() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;

    let totals = ActivityRepository::new(&pool)
        .checkout_totals(store_id, &one_hour_from_noon())
        .await
        .unwrap();
    assert_eq!(totals, CheckoutTotals::default());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_visitor_totals_are_half_open_and_count_deals_only() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let range = one_hour_from_noon();

    insert_visitor(&pool, store_id, "dev-a", 1, true, range.start).await;
    insert_visitor(&pool, store_id, "dev-a", 2, true, range.start + Duration::minutes(10)).await;
    insert_visitor(&pool, store_id, "dev-b", 3, false, range.start + Duration::minutes(20)).await;
    insert_visitor(&pool, store_id, "dev-c", 4, true, range.end).await;

    let totals = ActivityRepository::new(&pool)
        .visitor_totals(store_id, &range)
        .await
        .unwrap();
    assert_eq!(totals, VisitorTotals { users: 1, products: 2 });
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_record_otf_inserts_then_updates() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let activity = ActivityRepository::new(&pool);

    assert_eq!(activity.record_otf(store_id, "dev-otf", true).await.unwrap(), 1);

    let rows: Vec<(bool, bool)> = sqlx::query_as(
        "SELECT isotf, gotdeal FROM visitor WHERE storeid = $1 AND anonymousid = 'dev-otf'",
    )
    .bind(store_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows, vec![(true, false)]);

    assert_eq!(activity.record_otf(store_id, "dev-otf", false).await.unwrap(), 1);

    let rows: Vec<(bool,)> =
        sqlx::query_as("SELECT isotf FROM visitor WHERE storeid = $1 AND anonymousid = 'dev-otf'")
            .bind(store_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows, vec![(false,)]);
}

// =============================================================================
// Stores
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_toggle_deal_list_flips_flag() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let stores = StoreRepository::new(&pool);

    assert!(stores.require(store_id).await.unwrap().deal_list.active);
    assert!(!stores.toggle_deal_list(store_id).await.unwrap());
    assert!(!stores.require(store_id).await.unwrap().deal_list.active);
    assert!(stores.toggle_deal_list(store_id).await.unwrap());

    let err = stores.toggle_deal_list(StoreId::new(-1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_reinstall_replaces_token_and_keeps_settings() {
    let pool = test_pool().await;
    let stores = StoreRepository::new(&pool);
    let shop = unique_shop();

    let first = stores
        .upsert_installed("Acme", &shop, "shpat_first", "EUR")
        .await
        .unwrap();

    let settings = DealListSettings {
        title: "Flash sale".to_string(),
        delay_seconds: 30,
        ..DealListSettings::default()
    };
    stores.update_deal_list(first.id, &settings).await.unwrap();
    stores
        .update_discount_defaults(first.id, 15, DiscountCategory::FixedAmount)
        .await
        .unwrap();

    let second = stores
        .upsert_installed("Acme Renamed", &shop, "shpat_second", "USD")
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.name, "Acme Renamed");
    assert_eq!(second.currency, "USD");
    assert_eq!(second.api_token.unwrap().expose_secret(), "shpat_second");
    assert_eq!(second.deal_list, settings);
    assert_eq!(second.default_discount, Some(15));
    assert_eq!(second.discount_category, DiscountCategory::FixedAmount);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_get_by_url() {
    let pool = test_pool().await;
    let stores = StoreRepository::new(&pool);
    let shop = unique_shop();

    let installed = stores
        .upsert_installed("Acme", &shop, "shpat_token", "EUR")
        .await
        .unwrap();

    let found = stores.get_by_url(&shop).await.unwrap().unwrap();
    assert_eq!(found.id, installed.id);
    assert!(stores.get_by_url(&unique_shop()).await.unwrap().is_none());
}

// =============================================================================
// Campaigns
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_campaign_products_round_trip() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let campaigns = CampaignRepository::new(&pool);

    let campaign_id = active_campaign(&pool, store_id).await;
    let latest = campaigns.latest_active(store_id).await.unwrap().unwrap();
    assert_eq!(latest.id, campaign_id);
    assert_eq!(latest.discount, 20);

    let first = campaigns
        .add_product(&campaign_product(campaign_id, store_id, 42))
        .await
        .unwrap();
    campaigns
        .add_product(&campaign_product(campaign_id, store_id, 43))
        .await
        .unwrap();

    let products = campaigns.products(campaign_id).await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, first);
    assert_eq!(products[0].product_id, 42);
    assert_eq!(products[0].title, "Product 42");
    assert_eq!(products[0].deals, 0);
    assert_eq!(products[0].price, 2400);
    assert!(products[0].email_sent_to.is_empty());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_campaign_rejects_end_before_start() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;

    let result = CampaignRepository::new(&pool)
        .create(store_id, noon(), noon(), 10, CampaignStatus::Inactive)
        .await;
    assert!(matches!(result, Err(RepositoryError::Database(_))));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_top_products_order_limit_and_zero_fill() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let campaigns = CampaignRepository::new(&pool);
    let campaign_id = active_campaign(&pool, store_id).await;

    // product id 10..=15 with 10, 20, .. 60 deals
    for (product_id, deals) in (10..=15).zip((1..=6).map(|n| n * 10)) {
        let id = campaigns
            .add_product(&campaign_product(campaign_id, store_id, product_id))
            .await
            .unwrap();
        sqlx::query("UPDATE campaign_product SET deals = $2 WHERE id = $1")
            .bind(id)
            .bind(deals)
            .execute(&pool)
            .await
            .unwrap();
    }
    insert_checkout(&pool, store_id, 15, 3000, 300, noon()).await;
    insert_checkout(&pool, store_id, 15, 1000, 100, noon()).await;
    insert_checkout(&pool, store_id, 13, 800, 80, noon()).await;

    let top = campaigns.top_products(store_id, 5).await.unwrap();

    let ids: Vec<i64> = top.iter().map(|p| p.product_id).collect();
    assert_eq!(ids, vec![15, 14, 13, 12, 11]);
    assert_eq!(top[0].deals, 60);
    assert_eq!((top[0].gmv, top[0].discount), (4000, 400));
    assert_eq!((top[1].gmv, top[1].discount), (0, 0));
    assert_eq!((top[2].gmv, top[2].discount), (800, 80));
}

// =============================================================================
// Buyers
// =============================================================================

#[tokio::test]
#[ignore = "Requires database"]
async fn test_buyers_create_and_list() {
    let pool = test_pool().await;
    let store_id = create_store(&pool, None).await;
    let buyers = BuyerRepository::new(&pool);

    let new_buyer = NewBuyer {
        anonymous_id: "dev-buyer".to_string(),
        email: Some("shopper@acme.test".to_string()),
        store_id,
        product_id: 42,
        got_deal: true,
        clicked_deal: false,
        campaign_product_id: None,
    };
    let created = buyers.create(&new_buyer).await.unwrap();
    assert_eq!(created.anonymous_id, "dev-buyer");
    assert!(created.got_deal);
    assert!(!created.clicked_deal);

    let err = buyers.create(&new_buyer).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    buyers
        .create(&NewBuyer {
            product_id: 43,
            email: None,
            ..new_buyer.clone()
        })
        .await
        .unwrap();

    let listed = buyers.list_by_store(store_id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|b| b.store_id == store_id));

    let other_store = create_store(&pool, None).await;
    assert!(buyers.list_by_store(other_store).await.unwrap().is_empty());
}
