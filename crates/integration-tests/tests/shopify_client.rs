//! Shopify REST client tests against an in-process stub of the Admin API.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Form, Json, Router};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use slaash_dashboard::models::DealListSettings;
use slaash_dashboard::shopify::{
    DEAL_LIST_ASSET_KEY, PriceRuleInput, ShopifyClient, ShopifyError, StoreClient,
};
use slaash_integration_tests::{spawn, test_shopify_config};

const SHOP: &str = "acme.myshopify.com";
const TOKEN: &str = "shpat_stub_token";

#[derive(Clone, Default)]
struct Recorded {
    assets: Arc<Mutex<Vec<Value>>>,
    price_rules: Arc<Mutex<Vec<Value>>>,
    deleted_rules: Arc<Mutex<Vec<String>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("X-Shopify-Access-Token")
        .is_some_and(|v| v == TOKEN)
}

async fn access_token(Form(form): Form<Vec<(String, String)>>) -> Response {
    let code = form.iter().find(|(k, _)| k == "code").map(|(_, v)| v.as_str());
    if code == Some("good-code") {
        Json(json!({"access_token": TOKEN, "scope": "read_products,write_themes"})).into_response()
    } else {
        (StatusCode::BAD_REQUEST, "invalid code").into_response()
    }
}

async fn shop(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "[API] Invalid API key or access token").into_response();
    }
    Json(json!({
        "shop": {
            "id": 1,
            "name": "Acme",
            "email": "owner@acme.test",
            "myshopify_domain": SHOP,
            "currency": "EUR",
            "shop_owner": "Ada Lovelace"
        }
    }))
    .into_response()
}

async fn themes() -> Json<Value> {
    Json(json!({
        "themes": [
            {"id": 11, "name": "Dawn (draft)", "role": "unpublished"},
            {"id": 12, "name": "Dawn", "role": "main"}
        ]
    }))
}

async fn put_asset(
    State(recorded): State<Recorded>,
    Path(theme_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if theme_id != 12 {
        return StatusCode::NOT_FOUND.into_response();
    }
    let key = body["asset"]["key"].clone();
    recorded.assets.lock().unwrap().push(body);
    Json(json!({"asset": {"key": key, "public_url": "https://cdn.test/asset.js"}})).into_response()
}

async fn product(Path(file): Path<String>) -> Response {
    match file.strip_suffix(".json") {
        Some("42") => Json(json!({
            "product": {
                "id": 42,
                "title": "Ceramic Mug",
                "handle": "ceramic-mug",
                "images": [
                    {"id": 2, "src": "https://cdn.test/mug-2.png", "position": 2},
                    {"id": 1, "src": "https://cdn.test/mug-1.png", "position": 1}
                ]
            }
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, json!({"errors": "Not Found"}).to_string()).into_response(),
    }
}

async fn list_price_rules() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "3.0")], "Exceeded 2 calls per second").into_response()
}

async fn create_price_rule(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    let mut rule = body["price_rule"].clone();
    rule["id"] = json!(9001);
    recorded.price_rules.lock().unwrap().push(body);
    Json(json!({"price_rule": rule}))
}

async fn create_discount_code(Path(rule_id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "discount_code": {
            "id": 555,
            "price_rule_id": rule_id,
            "code": body["discount_code"]["code"],
            "usage_count": 0,
            "created_at": null,
            "updated_at": null
        }
    }))
}

async fn delete_price_rule(State(recorded): State<Recorded>, Path(file): Path<String>) -> StatusCode {
    if file == "9001.json" {
        recorded.deleted_rules.lock().unwrap().push(file);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

fn stub(recorded: Recorded) -> Router {
    Router::new()
        .route("/admin/oauth/access_token", post(access_token))
        .route("/admin/api/2024-10/shop.json", get(shop))
        .route("/admin/api/2024-10/themes.json", get(themes))
        .route("/admin/api/2024-10/themes/{theme_id}/assets.json", put(put_asset))
        .route("/admin/api/2024-10/products/{file}", get(product))
        .route(
            "/admin/api/2024-10/price_rules.json",
            get(list_price_rules).post(create_price_rule),
        )
        .route("/admin/api/2024-10/price_rules/{file}", delete(delete_price_rule))
        .route(
            "/admin/api/2024-10/price_rules/{rule_id}/discount_codes.json",
            post(create_discount_code),
        )
        .with_state(recorded)
}

async fn client(recorded: Recorded) -> ShopifyClient {
    let addr = spawn(stub(recorded)).await;
    ShopifyClient::with_origin(&test_shopify_config(), &format!("http://{addr}")).unwrap()
}

fn store(client: &ShopifyClient) -> StoreClient {
    client.store(SHOP, SecretString::from(TOKEN))
}

#[tokio::test]
async fn test_exchange_code_and_shop_info() {
    let client = client(Recorded::default()).await;

    let token = client.exchange_code(SHOP, "good-code").await.unwrap();
    assert_eq!(token.access_token.expose_secret(), TOKEN);

    let info = client.store(SHOP, token.access_token).shop_info().await.unwrap();
    assert_eq!(info.name, "Acme");
    assert_eq!(info.currency, "EUR");
    assert_eq!(
        info.owner_names(),
        ("Ada".to_string(), "Lovelace".to_string())
    );
}

#[tokio::test]
async fn test_exchange_code_rejected() {
    let client = client(Recorded::default()).await;
    let err = client.exchange_code(SHOP, "bad-code").await.unwrap_err();
    assert!(matches!(err, ShopifyError::OAuth(_)));
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let client = client(Recorded::default()).await;
    let err = client
        .store(SHOP, SecretString::from("shpat_revoked"))
        .shop_info()
        .await
        .unwrap_err();
    assert!(matches!(err, ShopifyError::Unauthorized));
}

#[tokio::test]
async fn test_deal_list_config_goes_to_main_theme() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;

    let settings = DealListSettings::default();
    let asset = store(&client).push_deal_list_config(&settings).await.unwrap();
    assert_eq!(asset.key, DEAL_LIST_ASSET_KEY);

    let assets = recorded.assets.lock().unwrap();
    assert_eq!(assets.len(), 1);
    let value = assets[0]["asset"]["value"].as_str().unwrap();
    assert!(value.starts_with("window.SlaashConfig = "));
    assert!(value.contains("\"position\":\"bottom-right\""));
}

#[tokio::test]
async fn test_product_lookup() {
    let client = client(Recorded::default()).await;
    let store = store(&client);

    let product = store.get_product(42).await.unwrap();
    assert_eq!(product.title, "Ceramic Mug");
    assert_eq!(product.first_image(), Some("https://cdn.test/mug-1.png"));

    let err = store.get_product(7).await.unwrap_err();
    assert!(matches!(err, ShopifyError::NotFound(_)));
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let client = client(Recorded::default()).await;
    let err = store(&client).list_price_rules(50).await.unwrap_err();
    assert!(matches!(err, ShopifyError::RateLimited(3)));
}

#[tokio::test]
async fn test_price_rule_and_code() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;
    let store = store(&client);

    let input = PriceRuleInput {
        title: "SLAASH-15".to_string(),
        target_type: "line_item".to_string(),
        target_selection: "all".to_string(),
        allocation_method: "across".to_string(),
        value_type: "percentage".to_string(),
        value: Decimal::from(-15),
        customer_selection: "all".to_string(),
        starts_at: chrono::Utc::now(),
    };
    let rule = store.create_price_rule(&input).await.unwrap();
    assert_eq!(rule.id, 9001);
    assert_eq!(rule.title, "SLAASH-15");

    let sent = recorded.price_rules.lock().unwrap()[0].clone();
    assert_eq!(sent["price_rule"]["value"], "-15");
    assert_eq!(sent["price_rule"]["target_type"], "line_item");

    let code = store
        .create_discount_code(rule.id, "SLAASH-15-ABCDEF12")
        .await
        .unwrap();
    assert_eq!(code.id, 555);
    assert_eq!(code.price_rule_id, 9001);
    assert_eq!(code.code, "SLAASH-15-ABCDEF12");
}

#[tokio::test]
async fn test_delete_price_rule() {
    let recorded = Recorded::default();
    let client = client(recorded.clone()).await;
    let store = store(&client);

    store.delete_price_rule(9001).await.unwrap();
    assert_eq!(*recorded.deleted_rules.lock().unwrap(), vec!["9001.json".to_string()]);

    let err = store.delete_price_rule(404).await.unwrap_err();
    assert!(matches!(err, ShopifyError::NotFound(_)));
}
