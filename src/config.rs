//! Connection settings for a SystemLink server.

use std::env;
use std::time::Duration;

use crate::error::{Result, SystemLinkError};

const DEFAULT_SERVER_URI: &str = "https://api.systemlinkcloud.com";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SYSTEMLINK_API_KEY";
/// Environment variable holding the server URI.
pub const SERVER_URI_ENV: &str = "SYSTEMLINK_SERVER_URI";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "SYSTEMLINK_TIMEOUT_SECS";

/// Where and how to reach a SystemLink server.
#[derive(Clone)]
pub struct HttpConfiguration {
    /// Server root, e.g. `https://my-server.example.com`.
    pub server_uri: String,
    /// API key sent in the `x-ni-api-key` header.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfiguration")
            .field("server_uri", &self.server_uri)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpConfiguration {
    /// Configuration for a server authenticated by API key.
    pub fn new(server_uri: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_uri: server_uri.into(),
            api_key: Some(api_key.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read configuration from `SYSTEMLINK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SYSTEMLINK_API_KEY` is not set or the timeout is
    /// not a whole number of seconds.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV).map_err(|_| {
            SystemLinkError::ConfigMissing(format!("{API_KEY_ENV} environment variable not set"))
        })?;
        let server_uri =
            env::var(SERVER_URI_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URI.to_string());

        let timeout = match env::var(TIMEOUT_ENV) {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    SystemLinkError::ConfigMissing(format!(
                        "{TIMEOUT_ENV} must be a number of seconds, got '{raw}'"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            server_uri,
            api_key: Some(api_key),
            timeout,
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_api_key() {
        let config = HttpConfiguration::new("https://example.com", "secret-key");
        let debug = format!("{config:?}");
        assert!(debug.contains("example.com"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn test_with_timeout() {
        let config =
            HttpConfiguration::new("https://example.com", "k").with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
