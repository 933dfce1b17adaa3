//! Shared request plumbing for the backend API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use super::ApiError;
use super::wire::ErrorBody;
use crate::config::StorefrontConfig;
use crate::state::SessionStore;

/// Transport-level timeout for every request.
///
/// Checkout steps are additionally bounded by the shorter per-call timeout
/// from [`StorefrontConfig::call_timeout`].
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend API client.
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// Every request carries the session's bearer token when one is set.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig, session: SessionStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("furnistore/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            session,
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Start a request to `path` (relative to the API base), with auth attached.
    pub(super) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match self.session.token() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Start a request that never carries credentials.
    pub(super) fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.endpoint(path))
    }

    /// Send a request and check its status.
    ///
    /// A 401 clears the session before returning [`ApiError::Unauthorized`].
    pub(super) async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected credentials, clearing session");
            self.session.clear();
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: ErrorBody::parse(&body),
            });
        }

        Ok(response)
    }

    /// Send a request and parse the JSON body.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Map a reqwest failure, surfacing its own timeout as [`ApiError::Timeout`].
fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(REQUEST_TIMEOUT)
    } else {
        ApiError::Http(err)
    }
}
