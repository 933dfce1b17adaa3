//! Command implementations.
//!
//! Output meant for the user goes to stdout; diagnostics go through `tracing`.

pub mod account;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
mod terminal;

use std::sync::Arc;

use furnistore_storefront::api::LoginOutcome;
use furnistore_storefront::checkout::{CheckoutOptions, Collaborators};
use furnistore_storefront::config::ConfigError;
use furnistore_storefront::state::{CartRepository, SessionStore};
use furnistore_storefront::{
    ApiClient, ApiError, CheckoutError, CheckoutOrchestrator, StorefrontConfig,
};
use secrecy::SecretString;
use thiserror::Error;

use crate::GlobalArgs;

/// Errors reported by commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// No valid session and no credentials given.
    #[error("Not signed in. Pass --username and --password, or set FURNISTORE_TOKEN.")]
    NotSignedIn,

    /// `--username` without `--password`.
    #[error("--password is required with --username")]
    MissingPassword,

    /// The backend refused the credentials.
    #[error("Login failed: {}", .0.as_deref().unwrap_or("invalid username or password"))]
    InvalidCredentials(Option<String>),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Cart edit or checkout failed; the user has already been notified.
    #[error("{0}")]
    Checkout(#[from] CheckoutError),
}

impl CliError {
    /// Whether the failure was already shown through the checkout notices.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Checkout(err) if !matches!(err, CheckoutError::Busy))
    }
}

/// Environment configuration with command-line overrides applied.
///
/// # Errors
///
/// Returns `ConfigError` if the environment or an override is invalid.
pub fn load_config(args: &GlobalArgs) -> Result<StorefrontConfig, ConfigError> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config.api_url = StorefrontConfig::for_api_url(url)?.api_url;
    }
    if let Some(lang) = &args.lang {
        config.language = lang
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("--lang".to_string(), e))?;
    }
    Ok(config)
}

/// A configured client, its session, and the orchestrator driving the cart.
pub struct Shop {
    pub config: StorefrontConfig,
    pub client: ApiClient,
    pub session: SessionStore,
    pub orchestrator: CheckoutOrchestrator,
}

impl Shop {
    /// Build the client and sign in if credentials were given.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the client cannot be built or login fails.
    pub async fn connect(config: &StorefrontConfig, args: &GlobalArgs) -> Result<Self, CliError> {
        let session = config
            .token
            .clone()
            .map(SessionStore::with_token)
            .unwrap_or_default();
        let client = ApiClient::new(config, session.clone())?;

        if let Some(username) = &args.username {
            let password = args.password.clone().ok_or(CliError::MissingPassword)?;
            match client.login(username, &SecretString::from(password)).await? {
                LoginOutcome::SignedIn(user) => {
                    tracing::debug!(username = %user.username, "Signed in for this command");
                }
                LoginOutcome::InvalidCredentials(reason) => {
                    return Err(CliError::InvalidCredentials(reason));
                }
            }
        }

        let orchestrator = CheckoutOrchestrator::new(
            Collaborators::from_client(&client),
            CartRepository::new(),
            session.clone(),
            Arc::new(terminal::TerminalUi),
            CheckoutOptions::from(config),
        );

        Ok(Self {
            config: config.clone(),
            client,
            session,
            orchestrator,
        })
    }

    /// Fail early when there is no unexpired token.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotSignedIn` if the session is missing or expired.
    pub fn require_session(&self) -> Result<(), CliError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}
