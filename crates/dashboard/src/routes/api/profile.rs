//! User profile and password settings.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use slaash_core::{AccessLevel, Email};

use crate::db::{RepositoryError, StoreRepository, UserRepository};
use crate::error::{AppError, AppJson, set_sentry_user};
use crate::middleware::RequireUser;
use crate::models::{CurrentUser, Store, session_keys};
use crate::services::AuthService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserProfile {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub access_level: AccessLevel,
    pub store_id: i32,
    pub store_name: String,
    pub store_url: String,
    pub currency: String,
}

impl UserProfile {
    fn new(user: CurrentUser, store: Store) -> Self {
        Self {
            user_id: user.id.as_i32(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email.into_inner(),
            access_level: user.access_level,
            store_id: store.id.as_i32(),
            store_name: store.name,
            store_url: store.url,
            currency: store.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
}

/// GET /api/get_user_profile
pub async fn get_user_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<UserProfile>, AppError> {
    let store = StoreRepository::new(state.pool())
        .require(user.store_id)
        .await?;
    Ok(Json(UserProfile::new(user, store)))
}

/// POST /api/update_profile
///
/// The session copy of the user is replaced so later requests see the new
/// name and email.
#[instrument(skip(state, session, user, body), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireUser(user): RequireUser,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let first_name = body.first_name.trim();
    let last_name = body.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::BadRequest(
            "first and last name are required".to_string(),
        ));
    }
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, first_name, last_name, &email)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("email is already in use".to_string())
            }
            other => other.into(),
        })?;

    let current = CurrentUser::from(&updated);
    session.insert(session_keys::CURRENT_USER, &current).await?;
    set_sentry_user(updated.id.as_i32(), Some(updated.email.as_str()));

    let store = StoreRepository::new(state.pool())
        .require(current.store_id)
        .await?;

    tracing::info!("profile updated");
    Ok(Json(UserProfile::new(current, store)))
}

/// POST /api/update_password
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    AppJson(body): AppJson<UpdatePasswordRequest>,
) -> Result<StatusCode, AppError> {
    AuthService::new(state.pool())
        .change_password(
            user.id,
            body.current_password.as_deref(),
            &body.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
