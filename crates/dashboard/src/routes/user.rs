//! Password login, logout and the session check endpoint.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::StoreRepository;
use crate::error::{AppError, AppJson, clear_sentry_user, set_sentry_user};
use crate::middleware::csrf::session_token;
use crate::middleware::{OptionalUser, RequireUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::shopify::is_valid_shop_domain;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/test", get(test_session))
        .route("/user/login", get(login_page).post(login))
        .route("/user/logout", post(logout))
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "user/login.html")]
pub struct LoginTemplate {
    /// Pre-filled shop for the "Login with Shopify" link.
    pub shop: Option<String>,
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub shop: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile returned after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResponse {
    pub user_id: i32,
    pub store_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&CurrentUser> for LoginResponse {
    fn from(user: &CurrentUser) -> Self {
        Self {
            user_id: user.id.as_i32(),
            store_id: user.store_id.as_i32(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /user/login - Login page, or straight to the app when logged in.
async fn login_page(
    session: Session,
    OptionalUser(user): OptionalUser,
    Query(query): Query<LoginPageQuery>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let csrf_token = session_token(&session).await?;

    let template = LoginTemplate {
        shop: query.shop.filter(|s| is_valid_shop_domain(s)),
        csrf_token,
    };

    let html = template
        .render()
        .map_err(|e| AppError::Internal(format!("template render error: {e}")))?;
    Ok(Html(html).into_response())
}

/// POST /user/login - Email and password login.
#[instrument(skip(state, session, body), fields(email = %body.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse::from(&current)))
}

/// POST /user/logout - End the session.
async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /test - Show who the session belongs to.
async fn test_session(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<String, AppError> {
    let store = StoreRepository::new(state.pool())
        .require(user.store_id)
        .await?;

    Ok(format!(
        "{}\n{}\n{}\n",
        user.first_name, user.last_name, store.name
    ))
}
