//! Bearer-token authentication.
//!
//! Tokens look like JWTs (`header.payload.signature`, base64url without
//! padding) so the storefront's expiry check can read them, but the signature
//! is random and only tokens this process issued are accepted.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::error::MockError;
use crate::state::{AppState, Fault};

/// How long an issued token stays valid.
pub const TOKEN_LIFETIME: Duration = Duration::hours(24);

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_auth: RequireAuth) -> impl IntoResponse {
///     "only for signed-in users"
/// }
/// ```
pub struct RequireAuth;

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = MockError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.faults().take(Fault::RejectAuth) {
            return Err(MockError::Unauthorized);
        }

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(MockError::Unauthorized)?;

        if state.accepts_token(token).await {
            Ok(Self)
        } else {
            Err(MockError::Unauthorized)
        }
    }
}

/// Build a token for `subject` expiring `TOKEN_LIFETIME` after `now`.
#[must_use]
pub fn issue_token(subject: &str, now: DateTime<Utc>) -> String {
    let header = json!({ "alg": "none", "typ": "JWT" });
    let claims = json!({
        "sub": subject,
        "iat": now.timestamp(),
        "exp": (now + TOKEN_LIFETIME).timestamp(),
    });
    let signature: [u8; 16] = rand::random();

    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        URL_SAFE_NO_PAD.encode(signature)
    )
}
