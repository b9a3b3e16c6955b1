//! Session-related types for dashboard authentication.

use serde::{Deserialize, Serialize};

use slaash_core::{AccessLevel, Email, StoreId, UserId};

use super::user::User;

/// Session-stored user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub store_id: StoreId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub access_level: AccessLevel,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            store_id: user.store_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            access_level: user.access_level,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the per-session CSRF token.
    pub const CSRF_TOKEN: &str = "csrf_token";

    /// Key for the OAuth `state` nonce between `login` and `callback`.
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Key for the shop domain that started the OAuth flow.
    pub const OAUTH_SHOP: &str = "oauth_shop";
}
