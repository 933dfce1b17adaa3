//! Login and profile endpoints.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use super::wire::{ErrorBody, LoginEnvelope};
use super::{ApiClient, ApiError};
use crate::models::{SessionUser, UserProfile};
use crate::state::Session;

/// Result of a login attempt that reached the backend.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials accepted; the session has been stored.
    SignedIn(SessionUser),
    /// Credentials refused, with the server's explanation when given.
    InvalidCredentials(Option<String>),
}

impl ApiClient {
    /// Sign in and store the issued token in the session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    /// Rejected credentials are reported as [`LoginOutcome::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, ApiError> {
        let form = [("username", username), ("password", password.expose_secret())];
        let response = self
            .anonymous(Method::POST, "/users/login")
            .form(&form)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Ok(LoginOutcome::InvalidCredentials(ErrorBody::parse(&body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorBody::parse(&body),
            });
        }

        let envelope: LoginEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let Some(token) = envelope.token else {
            return Ok(LoginOutcome::InvalidCredentials(envelope.error));
        };

        let user = envelope.user.unwrap_or_else(|| SessionUser {
            id: None,
            username: username.to_string(),
            email: None,
        });
        self.session().set(Session {
            token: SecretString::from(token),
            user: Some(user.clone()),
        });
        info!(username = %user.username, "Signed in");
        Ok(LoginOutcome::SignedIn(user))
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the profile cannot be parsed.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.send_json(self.request(Method::GET, "/users/profile"))
            .await
    }

    /// Forget the local session. The backend keeps no session state.
    pub fn logout(&self) {
        self.session().clear();
        info!("Signed out");
    }
}
