//! HTTP routes for the merchant dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Frontend
//! GET  /                       - Prebuilt single page app
//! GET  /static/*               - Frontend assets
//!
//! # Shopify OAuth
//! GET  /login?shop=            - Redirect to the Shopify consent screen
//! GET  /callback               - Finish the install, log the owner in
//!
//! # Password login
//! GET  /user/login             - Login page
//! POST /user/login             - Email and password login
//! POST /user/logout            - Logout
//! GET  /test                   - Who is logged in
//!
//! # JSON API (requires a session user)
//! GET  /api/...                - see [`api`]
//! ```
//!
//! Everything except the health checks and the frontend files sits behind
//! the CSRF guard.

pub mod api;
pub mod oauth;
pub mod user;

use std::path::Path;

use axum::{
    Router,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::from_fn,
    routing::get,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{csrf_middleware, request_id_middleware, session_layer};
use crate::state::AppState;

/// Application routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(user::router())
        .merge(api::router())
        .merge(oauth::router())
}

/// The prebuilt frontend.
fn frontend(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
}

/// The full application: routes, CSRF guard, health checks, sessions,
/// request ids and request tracing.
///
/// Generic over the session store so tests can run on `MemoryStore`.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let secure = state.config().is_secure();

    routes()
        .layer(from_fn(csrf_middleware))
        .merge(frontend(&state.config().static_dir))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .layer(session_layer(store, secure))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
