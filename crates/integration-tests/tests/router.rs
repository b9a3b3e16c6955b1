//! Router-level tests for the dashboard app.
//!
//! The app runs over an in-memory session store and a pool that is never
//! reached: every request here is answered by middleware, extractors or
//! input validation before a query would run.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use slaash_dashboard::middleware::{CSRF_HEADER, REQUEST_ID_HEADER};
use slaash_integration_tests::{
    TEST_CLIENT_SECRET, TEST_CSRF_TOKEN, logged_in_cookie, session_cookie, test_app, test_user,
};

const AUTH_FAILED: &str = "Authentication Failed, Retry!";

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, cookie: &str, csrf: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = csrf {
        builder = builder.header(CSRF_HEADER, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

// =============================================================================
// Health and plumbing
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = test_app(MemoryStore::default());
    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CSRF_HEADER).is_none());
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app(MemoryStore::default());
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "edge-1234")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "edge-1234");
}

#[tokio::test]
async fn test_frontend_index_is_served() {
    let app = test_app(MemoryStore::default());
    let response = send(&app, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<title>Slaash</title>"));
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_api_requires_session_user() {
    let app = test_app(MemoryStore::default());
    for uri in [
        "/api/get_dl_info",
        "/api/campaign_activity",
        "/api/deallist_activity?durationType=24hours",
        "/api/trending_products",
        "/api/get_user_profile",
        "/test",
    ] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body_text(response).await, AUTH_FAILED, "{uri}");
    }
}

#[tokio::test]
async fn test_login_page_renders_csrf_token() {
    let app = test_app(MemoryStore::default());
    let response = send(&app, get("/user/login?shop=acme.myshopify.com")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let token = response.headers()[CSRF_HEADER].to_str().unwrap().to_string();
    assert!(session_cookie(&response).is_some());

    let html = body_text(response).await;
    assert!(html.contains(&token));
    assert!(html.contains("/login?shop=acme.myshopify.com"));
}

#[tokio::test]
async fn test_login_page_redirects_logged_in_user() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let response = send(&app, get_with_cookie("/user/login", &cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

// =============================================================================
// CSRF
// =============================================================================

#[tokio::test]
async fn test_post_without_csrf_token_is_forbidden() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let response = send(&app, post_json("/user/logout", &cookie, None, &json!({}))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "CSRF token mismatch");

    let response = send(
        &app,
        post_json("/user/logout", &cookie, Some("not-the-token"), &json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_anonymous_reads_create_no_session() {
    let app = test_app(MemoryStore::default());
    for uri in ["/", "/static/app.css", "/static/app.css", "/api/get_dl_info", "/test"] {
        let response = send(&app, get(uri)).await;
        assert!(session_cookie(&response).is_none(), "{uri}");
        assert!(response.headers().get(CSRF_HEADER).is_none(), "{uri}");
    }
}

#[tokio::test]
async fn test_static_assets_skip_csrf_guard() {
    let app = test_app(MemoryStore::default());
    let response = send(&app, get("/static/app.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_post_without_session_is_forbidden() {
    let app = test_app(MemoryStore::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header(CSRF_HEADER, "guessed-token")
        .body(Body::from(
            json!({"email": "owner@acme.test", "password": "hunter2hunter2"}).to_string(),
        ))
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn test_existing_session_gets_token_on_read() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let response = send(&app, get_with_cookie("/user/login", &cookie)).await;
    assert_eq!(response.headers()[CSRF_HEADER], TEST_CSRF_TOKEN);
}

#[tokio::test]
async fn test_csrf_token_from_response_allows_logout() {
    let app = test_app(MemoryStore::default());

    let first = send(&app, get("/user/login")).await;
    let token = first.headers()[CSRF_HEADER].to_str().unwrap().to_string();
    let cookie = session_cookie(&first).unwrap();

    let response = send(
        &app,
        post_json("/user/logout", &cookie, Some(&token), &json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let response = send(
        &app,
        post_json("/user/logout", &cookie, Some(TEST_CSRF_TOKEN), &json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get_with_cookie("/api/get_dl_info", &cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Input validation (answered before any query runs)
// =============================================================================

#[tokio::test]
async fn test_duration_type_is_required() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    for uri in [
        "/api/deallist_activity",
        "/api/deallist_activity?durationType=yearly",
        "/api/otf_visitors",
        "/api/otf_visitors?durationType=",
    ] {
        let response = send(&app, get_with_cookie(uri, &cookie)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_if_otf_requires_anonymous_id() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let response = send(&app, get_with_cookie("/api/if_otf", &cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("anonymousid"));
}

#[tokio::test]
async fn test_config_dl_rejects_long_delay() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let body = json!({
        "active": true,
        "title": "Today only",
        "body": "",
        "delay_seconds": 500,
        "position": "center"
    });
    let response = send(
        &app,
        post_json("/api/config_dl", &cookie, Some(TEST_CSRF_TOKEN), &body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("delay_seconds"));
}

#[tokio::test]
async fn test_config_discounts_rejects_bad_values() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    for body in [
        json!({"default_discount": "abc", "discount_category": "percentage"}),
        json!({"default_discount": "150", "discount_category": "percentage"}),
        json!({"default_discount": "0", "discount_category": "fixed_amount"}),
    ] {
        let response = send(
            &app,
            post_json("/api/config_discounts", &cookie, Some(TEST_CSRF_TOKEN), &body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn test_malformed_json_bodies_are_bad_requests() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let cases = [
        (
            "/api/config_dl",
            json!({
                "active": true,
                "title": "Today only",
                "body": "",
                "delay_seconds": 5,
                "position": "middle"
            }),
        ),
        ("/api/config_discounts", json!({"default_discount": "10"})),
        ("/api/update_profile", json!({"first_name": "Ada"})),
        ("/user/login", json!({"email": "owner@acme.test"})),
    ];
    for (uri, body) in cases {
        let response = send(&app, post_json(uri, &cookie, Some(TEST_CSRF_TOKEN), &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_update_profile_rejects_invalid_email() {
    let store = MemoryStore::default();
    let app = test_app(store.clone());
    let cookie = logged_in_cookie(&store, &test_user()).await;

    let body = json!({"first_name": "Ada", "last_name": "Owner", "email": "not-an-email"});
    let response = send(
        &app,
        post_json("/api/update_profile", &cookie, Some(TEST_CSRF_TOKEN), &body),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Shopify OAuth dispatch
// =============================================================================

#[tokio::test]
async fn test_unknown_action_is_not_found() {
    let app = test_app(MemoryStore::default());
    let response = send(&app, get("/install")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oauth_login_rejects_invalid_shop() {
    let app = test_app(MemoryStore::default());
    for uri in ["/login", "/login?shop=evil.com", "/login?shop=a.myshopify.com.evil.com"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_oauth_login_redirects_to_shopify() {
    let app = test_app(MemoryStore::default());
    let response = send(&app, get("/login?shop=acme.myshopify.com")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://acme.myshopify.com/admin/oauth/authorize?"));
    assert!(location.contains("client_id=test-client-id"));
    assert!(location.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback"));
    assert!(location.contains("state="));
}

fn signed_callback_query(params: &[(&str, &str)], secret: &str) -> String {
    let sorted: BTreeMap<&str, &str> = params.iter().copied().collect();
    let message = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    let hmac = hex::encode(mac.finalize().into_bytes());
    format!("{message}&hmac={hmac}")
}

#[tokio::test]
async fn test_oauth_callback_rejects_bad_signature() {
    let app = test_app(MemoryStore::default());
    let query = signed_callback_query(
        &[
            ("code", "abc"),
            ("shop", "acme.myshopify.com"),
            ("state", "s1"),
            ("timestamp", "1700000000"),
        ],
        "wrong-secret",
    );
    let response = send(&app, get(&format!("/callback?{query}"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, AUTH_FAILED);
}

#[tokio::test]
async fn test_oauth_callback_rejects_unknown_state() {
    let app = test_app(MemoryStore::default());
    let query = signed_callback_query(
        &[
            ("code", "abc"),
            ("shop", "acme.myshopify.com"),
            ("state", "never-issued"),
            ("timestamp", "1700000000"),
        ],
        TEST_CLIENT_SECRET,
    );
    let response = send(&app, get(&format!("/callback?{query}"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oauth_callback_reports_denied_install() {
    let app = test_app(MemoryStore::default());
    let response = send(
        &app,
        get("/callback?error=access_denied&error_description=declined"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
