//! Mock backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MOCK_BACKEND_HOST` - Bind address (default: 127.0.0.1)
//! - `MOCK_BACKEND_PORT` - Listen port (default: 8081)
//! - `MOCK_BACKEND_TOKEN` - Extra bearer token accepted without logging in
//! - `MOCK_BACKEND_FAULTS` - Comma-separated faults to arm at startup
//!   (`order`, `intent`, `confirm`, `decline`, `hang`, `auth`)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use crate::state::Fault;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8081;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Mock backend configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct MockBackendConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Bearer token accepted in addition to the ones issued by login
    pub token: Option<SecretString>,
    /// Faults armed at startup
    pub faults: Vec<Fault>,
}

impl std::fmt::Debug for MockBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackendConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("faults", &self.faults)
            .finish()
    }
}

impl Default for MockBackendConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            token: None,
            faults: Vec::new(),
        }
    }
}

impl MockBackendConfig {
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

        let host = get_env_or_default("MOCK_BACKEND_HOST", DEFAULT_HOST)
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MOCK_BACKEND_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MOCK_BACKEND_PORT", &DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MOCK_BACKEND_PORT".to_string(), e.to_string()))?;
        let token = get_optional_env("MOCK_BACKEND_TOKEN").map(SecretString::from);
        let faults = get_optional_env("MOCK_BACKEND_FAULTS")
            .map(|raw| parse_faults(&raw))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            token,
            faults,
        })
    }

    /// Get the socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_faults(raw: &str) -> Result<Vec<Fault>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Fault>()
                .map_err(|e| ConfigError::InvalidEnvVar("MOCK_BACKEND_FAULTS".to_string(), e))
        })
        .collect()
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_faults() {
        assert_eq!(
            parse_faults("intent, decline,").unwrap(),
            vec![Fault::IntentCreation, Fault::DeclinePayment]
        );
        assert!(parse_faults("").unwrap().is_empty());
        assert!(parse_faults("explode").is_err());
    }

    #[test]
    fn test_default_socket_addr() {
        let config = MockBackendConfig::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8081");
    }
}
