//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, ClientResult};

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin including the API prefix, without a trailing slash
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Config for an explicit base URL with default timeouts.
    pub fn with_base_url(base_url: impl AsRef<str>) -> ClientResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            ..Default::default()
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("VDNA_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            timeout: Duration::from_secs(
                std::env::var("VDNA_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("VDNA_API_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        })
    }

    /// Absolute URL for an API path such as `analyses/history/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed)
        .map_err(|e| ClientError::config(format!("invalid base URL '{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ClientError::config(format!(
            "unsupported scheme '{}' in base URL '{}'",
            other, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::with_base_url("https://dna.example.com/api/").unwrap();
        assert_eq!(config.base_url, "https://dna.example.com/api");
        assert_eq!(
            config.endpoint("/analyses/history/"),
            "https://dna.example.com/api/analyses/history/"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ClientConfig::with_base_url("not a url"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::with_base_url("ftp://files.example.com"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("VDNA_API_URL", "https://staging.example.com/api/");
        std::env::set_var("VDNA_API_TIMEOUT_SECS", "12");
        let config = ClientConfig::from_env().unwrap();
        std::env::remove_var("VDNA_API_URL");
        std::env::remove_var("VDNA_API_TIMEOUT_SECS");

        assert_eq!(config.base_url, "https://staging.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::remove_var("VDNA_API_URL");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
