//! Session-bound CSRF tokens.
//!
//! Every existing session carries a random token. It is returned on each
//! response in the `x-csrf-token` header, and requests with an unsafe method
//! must send it back in the same header. New visitors get their token from
//! the login page.

use axum::{
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::session_keys;

/// Header carrying the CSRF token in both directions.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Whether the method can change state.
fn is_unsafe(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Whether `sent` matches `expected`, compared in constant time.
fn tokens_match(sent: &str, expected: &str) -> bool {
    sent.len() == expected.len()
        && sent
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Load the session token, creating one on first use.
///
/// Minting a token writes to the session, so callers outside the middleware
/// (the login page) use this to give a new visitor a session on purpose.
///
/// # Errors
///
/// Returns the session store error if the session cannot be read or written.
pub async fn session_token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(session_keys::CSRF_TOKEN).await? {
        return Ok(token);
    }
    let token = Uuid::new_v4().simple().to_string();
    session.insert(session_keys::CSRF_TOKEN, &token).await?;
    Ok(token)
}

fn session_failure(e: &tower_sessions::session::Error) -> Response {
    tracing::error!(error = %e, "failed to load CSRF token");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Reject unsafe requests without a matching token and expose the token on
/// responses of sessions that have one.
///
/// Safe requests without a session cookie pass through untouched, so
/// anonymous page and asset loads never create a session row.
pub async fn csrf_middleware(session: Session, request: Request, next: Next) -> Response {
    if is_unsafe(request.method()) {
        let expected = match session.get::<String>(session_keys::CSRF_TOKEN).await {
            Ok(token) => token,
            Err(e) => return session_failure(&e),
        };
        let sent = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|h| h.to_str().ok());

        let matches = sent
            .zip(expected.as_deref())
            .is_some_and(|(sent, expected)| tokens_match(sent, expected));
        if !matches {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "CSRF token mismatch"
            );
            return (StatusCode::FORBIDDEN, "CSRF token mismatch").into_response();
        }
    } else if session.id().is_some()
        && let Err(e) = session_token(&session).await
    {
        return session_failure(&e);
    }

    let mut response = next.run(request).await;

    // Read after the handler so a token minted by the handler is echoed too.
    if let Ok(Some(token)) = session.get::<String>(session_keys::CSRF_TOKEN).await
        && let Ok(value) = HeaderValue::from_str(&token)
    {
        response.headers_mut().insert(CSRF_HEADER, value);
    }

    response
}
