//! Shopify app install and login (OAuth authorization code grant).
//!
//! `GET /login?shop=...` starts the flow; Shopify redirects back to
//! `GET /callback`, which verifies the request, stores the offline token and
//! logs the store owner in.

use std::collections::BTreeMap;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use tower_sessions::Session;
use tracing::instrument;

use slaash_core::AccessLevel;

use crate::db::{RepositoryError, StoreRepository, UserRepository};
use crate::error::{AppError, set_sentry_user};
use crate::middleware::set_current_user;
use crate::models::user::NewUser;
use crate::models::{CurrentUser, Store, User, session_keys};
use crate::shopify::{ShopInfo, is_valid_shop_domain};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{action}", get(dispatch))
}

// =============================================================================
// HMAC Verification
// =============================================================================

type HmacSha256 = Hmac<Sha256>;

/// Verify the `hmac` Shopify attaches to redirects.
///
/// The signed message is every other query parameter (except `signature`),
/// sorted by key and joined as `key=value` pairs with `&`.
pub(crate) fn verify_shopify_hmac(params: &BTreeMap<String, String>, client_secret: &str) -> bool {
    let Some(provided) = params.get("hmac") else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let message = params
        .iter()
        .filter(|(k, _)| k.as_str() != "hmac" && k.as_str() != "signature")
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = HmacSha256::new_from_slice(client_secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /{action}
async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    Path(action): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    match action.as_str() {
        "login" => login(&state, &session, &params).await,
        "callback" => callback(&state, &session, &params).await,
        other => Err(AppError::NotFound(format!("/{other}"))),
    }
}

/// Redirect the merchant to Shopify's consent screen.
#[instrument(skip(state, session, params))]
async fn login(
    state: &AppState,
    session: &Session,
    params: &BTreeMap<String, String>,
) -> Result<Response, AppError> {
    let shop = params
        .get("shop")
        .map(String::as_str)
        .filter(|s| is_valid_shop_domain(s))
        .ok_or_else(|| AppError::BadRequest("shop must be a *.myshopify.com domain".to_string()))?;

    let oauth_state = uuid::Uuid::new_v4().to_string();
    session.insert(session_keys::OAUTH_STATE, &oauth_state).await?;
    session.insert(session_keys::OAUTH_SHOP, shop).await?;

    let auth_url = state.shopify().authorization_url(
        shop,
        &state.config().oauth_redirect_uri(),
        &oauth_state,
    );

    tracing::info!(shop, "redirecting to Shopify OAuth");
    Ok(Redirect::to(&auth_url).into_response())
}

/// Finish the install and log the owner in.
#[instrument(skip(state, session, params), fields(shop = params.get("shop").map(String::as_str)))]
async fn callback(
    state: &AppState,
    session: &Session,
    params: &BTreeMap<String, String>,
) -> Result<Response, AppError> {
    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map_or("", String::as_str);
        tracing::warn!(error = %error, description = %description, "Shopify OAuth denied");
        return Err(AppError::Unauthorized);
    }

    if !verify_shopify_hmac(params, state.shopify().client_secret().expose_secret()) {
        tracing::warn!("invalid HMAC signature in OAuth callback");
        return Err(AppError::Unauthorized);
    }

    let (Some(code), Some(callback_state), Some(shop)) =
        (params.get("code"), params.get("state"), params.get("shop"))
    else {
        tracing::warn!("OAuth callback is missing code, state or shop");
        return Err(AppError::Unauthorized);
    };

    let stored_state: Option<String> = session.remove(session_keys::OAUTH_STATE).await?;
    let stored_shop: Option<String> = session.remove(session_keys::OAUTH_SHOP).await?;
    if stored_state.as_ref() != Some(callback_state) || stored_shop.as_ref() != Some(shop) {
        tracing::warn!("OAuth state or shop does not match the session");
        return Err(AppError::Unauthorized);
    }

    let token = state.shopify().exchange_code(shop, code).await?;
    let shop_info = state
        .shopify()
        .store(shop, token.access_token.clone())
        .shop_info()
        .await?;

    let store = StoreRepository::new(state.pool())
        .upsert_installed(
            &shop_info.name,
            shop,
            token.access_token.expose_secret(),
            &shop_info.currency,
        )
        .await?;

    let owner = find_or_create_owner(state, &store, &shop_info).await?;
    let current = CurrentUser::from(&owner);
    set_current_user(session, &current).await?;
    set_sentry_user(owner.id.as_i32(), Some(owner.email.as_str()));

    tracing::info!(store_id = %store.id, scope = %token.scope, "store installed");
    Ok(Redirect::to("/").into_response())
}

/// The store's owner account, created from `shop.json` on first install.
async fn find_or_create_owner(
    state: &AppState,
    store: &Store,
    shop_info: &ShopInfo,
) -> Result<User, AppError> {
    let users = UserRepository::new(state.pool());
    if let Some(owner) = users.find_owner(store.id).await? {
        return Ok(owner);
    }

    let email = slaash_core::Email::parse(&shop_info.email)
        .map_err(|e| AppError::Internal(format!("shop email is invalid: {e}")))?;
    let (first_name, last_name) = shop_info.owner_names();
    let new_user = NewUser {
        store_id: store.id,
        first_name,
        last_name,
        email: email.clone(),
        access_level: AccessLevel::Owner,
    };

    match users.create(&new_user, None).await {
        Ok(user) => Ok(user),
        Err(RepositoryError::Conflict(_)) => {
            // Email already registered, accept it only within the same store.
            let existing = users.get_by_email(&email).await?;
            match existing {
                Some(user) if user.store_id == store.id => Ok(user),
                _ => Err(AppError::Forbidden(
                    "owner email belongs to another store".to_string(),
                )),
            }
        }
        Err(e) => Err(e.into()),
    }
}
