//! Authentication session: the bearer token and the signed-in user.
//!
//! The token is an opaque JWT issued by the backend. The client never
//! verifies its signature; it only inspects the `exp` claim so an expired
//! session can be dropped before a request is wasted on it.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::SessionUser;

/// Why a stored token was discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("token is not a well-formed JWT")]
    MalformedToken,
    #[error("token expired at {0}")]
    Expired(i64),
}

/// A signed-in session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    pub token: SecretString,
    pub user: Option<SessionUser>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Observable holder of the current session.
///
/// Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// A store seeded with a pre-issued token and no user details.
    #[must_use]
    pub fn with_token(token: SecretString) -> Self {
        let store = Self::new();
        store.tx.send_replace(Some(Session { token, user: None }));
        store
    }

    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.tx.borrow().as_ref().map(|s| s.token.clone())
    }

    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.tx.borrow().as_ref().and_then(|s| s.user.clone())
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace the session.
    pub fn set(&self, session: Session) {
        if let Some(user) = &session.user {
            match user.id {
                Some(id) => set_sentry_user(&id, user.email.as_deref()),
                None => set_sentry_user(&user.username, user.email.as_deref()),
            }
        }
        self.tx.send_replace(Some(session));
    }

    /// Drop the session. Subscribers are only notified if one was present.
    pub fn clear(&self) {
        let cleared = self.tx.send_if_modified(|session| session.take().is_some());
        if cleared {
            clear_sentry_user();
            debug!("Session cleared");
        }
    }

    /// Check the stored token's shape and expiry, clearing it if invalid.
    ///
    /// Returns `true` when a usable token remains.
    pub fn is_authenticated(&self) -> bool {
        let Some(token) = self.token() else {
            return false;
        };
        let now = chrono::Utc::now().timestamp();
        match check_token(token.expose_secret(), now) {
            Ok(()) => true,
            Err(err) => {
                info!(reason = %err, "Discarding stored session");
                self.clear();
                false
            }
        }
    }

    /// Watch for sign-in and sign-out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Check that `token` is a three-part JWT whose `exp` (if any) is not before `now`.
///
/// # Errors
///
/// Returns [`SessionError`] describing why the token is unusable.
pub fn check_token(token: &str, now: i64) -> Result<(), SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = parts.as_slice() else {
        return Err(SessionError::MalformedToken);
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map_err(|_| SessionError::MalformedToken)?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|_| SessionError::MalformedToken)?;

    match claims.exp {
        Some(exp) if exp < now => Err(SessionError::Expired(exp)),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// An unsigned token carrying the given `exp` claim.
    pub(crate) fn token_expiring_at(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"demo","exp":{exp}}}"#));
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_check_token() {
        assert_eq!(check_token(&token_expiring_at(2_000), 1_000), Ok(()));
        assert_eq!(
            check_token(&token_expiring_at(500), 1_000),
            Err(SessionError::Expired(500))
        );
        assert_eq!(check_token("abc", 0), Err(SessionError::MalformedToken));
        assert_eq!(check_token("a.!!!.c", 0), Err(SessionError::MalformedToken));

        let no_exp = format!("x.{}.y", URL_SAFE_NO_PAD.encode(br#"{"sub":"demo"}"#));
        assert_eq!(check_token(&no_exp, i64::MAX), Ok(()));
    }

    #[test]
    fn test_validate_clears_expired_session() {
        let store = SessionStore::with_token(SecretString::from(token_expiring_at(1)));
        assert!(store.is_signed_in());
        assert!(!store.is_authenticated());
        assert!(!store.is_signed_in());

        let far_future = chrono::Utc::now().timestamp() + 3_600;
        let store = SessionStore::with_token(SecretString::from(token_expiring_at(far_future)));
        assert!(store.is_authenticated());
        assert!(store.is_signed_in());
    }

    #[test]
    fn test_clones_share_state_and_notify() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        let clone = store.clone();

        clone.set(Session {
            token: SecretString::from("t.o.k"),
            user: Some(SessionUser {
                id: None,
                username: "demo".to_string(),
                email: None,
            }),
        });
        assert!(rx.has_changed().unwrap());
        assert_eq!(store.user().unwrap().username, "demo");
        drop(rx.borrow_and_update());

        store.clear();
        assert!(rx.has_changed().unwrap());
        drop(rx.borrow_and_update());

        // Clearing an empty session is silent.
        store.clear();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session {
            token: SecretString::from("super-secret-token"),
            user: None,
        };
        assert!(!format!("{session:?}").contains("super-secret-token"));
    }
}
