//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FURNISTORE_API_URL` - Backend API base URL
//!   (default: `http://localhost:8081/furniture-store/api`)
//! - `FURNISTORE_CALL_TIMEOUT_SECS` - Per-call timeout for checkout steps (default: 15, 1-120)
//! - `FURNISTORE_LANGUAGE` - Language for fallback messages, `en` or `zh` (default: en)
//! - `FURNISTORE_TOKEN` - Pre-issued bearer token to start with a session
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default backend used by development builds.
pub const DEFAULT_API_URL: &str = "http://localhost:8081/furniture-store/api";

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 15;
const MAX_CALL_TIMEOUT_SECS: u64 = 120;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Language used for user-facing fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    /// Traditional Chinese (Hong Kong).
    ZhHant,
}

impl Language {
    /// Code sent as the backend's `lang` query parameter.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhHant => "zh",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-hk" => Ok(Self::En),
            "zh" | "zh-hk" | "zh-hant" | "zh-tw" => Ok(Self::ZhHant),
            _ => Err(format!("unsupported language: {s}")),
        }
    }
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the token and the Sentry DSN.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend API base URL (no trailing slash)
    pub api_url: Url,
    /// Upper bound for each remote call made during checkout
    pub call_timeout: Duration,
    /// Language for fallback messages
    pub language: Language,
    /// Bearer token to seed the session with
    pub token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("call_timeout", &self.call_timeout)
            .field("language", &self.language)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_env_or_default("FURNISTORE_API_URL", DEFAULT_API_URL))?;
        let call_timeout = parse_call_timeout(&get_env_or_default(
            "FURNISTORE_CALL_TIMEOUT_SECS",
            &DEFAULT_CALL_TIMEOUT_SECS.to_string(),
        ))?;
        let language = get_env_or_default("FURNISTORE_LANGUAGE", "en")
            .parse::<Language>()
            .map_err(|e| ConfigError::InvalidEnvVar("FURNISTORE_LANGUAGE".to_string(), e))?;
        let token = get_optional_env("FURNISTORE_TOKEN").map(SecretString::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN").map(SecretString::from);

        Ok(Self {
            api_url,
            call_timeout,
            language,
            token,
            sentry_dsn,
        })
    }

    /// Configuration pointing at an explicit backend, with defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_api_url(parse_api_url(api_url)?))
    }

    const fn with_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            language: Language::En,
            token: None,
            sentry_dsn: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, dropping any trailing slash so paths can be appended.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar("FURNISTORE_API_URL".to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "FURNISTORE_API_URL".to_string(),
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Parse and bound the per-call timeout.
fn parse_call_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("FURNISTORE_CALL_TIMEOUT_SECS".to_string(), e.to_string())
    })?;
    if !(1..=MAX_CALL_TIMEOUT_SECS).contains(&secs) {
        return Err(ConfigError::InvalidEnvVar(
            "FURNISTORE_CALL_TIMEOUT_SECS".to_string(),
            format!("must be between 1 and {MAX_CALL_TIMEOUT_SECS} (got {secs})"),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
