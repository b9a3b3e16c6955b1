//! HTTP middleware for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transactions)
//! 2. `TraceLayer` (`http_request` span)
//! 3. Request ID (`x-request-id`)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. CSRF check (every route except `/health*`, `/` and `/static/*`)
//!
//! Authentication is enforced per handler with the [`RequireUser`] extractor.

pub mod auth;
pub mod csrf;
pub mod request_id;
pub mod session;

pub use auth::{OptionalUser, RequireUser, clear_current_user, set_current_user};
pub use csrf::{CSRF_HEADER, csrf_middleware};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, session_layer};
