//! Session lookup. Sign-in, sign-up and session issuance live in the external
//! auth service; this module only resolves the token it left in the request.

use axum::http::{HeaderMap, header};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::Session;

/// `getSession(headers)`: resolve the request's session, if any.
pub async fn get_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Session>, AppError> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };
    Ok(state.store.session(&token).await?)
}

pub async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, AppError> {
    get_session(state, headers)
        .await?
        .ok_or(AppError::Unauthenticated)
}

/// The gateway authenticates with a static `Authorization: Apikey <secret>`
/// header. Both sides get trimmed; SePay pads the configured key.
pub fn authorize_webhook(headers: &HeaderMap, secret: &str) -> Result<(), AppError> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if provided.trim() != format!("Apikey {}", secret.trim()) {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.trim().to_string());
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "session_token")
        .map(|(_, value)| value.to_string())
}
