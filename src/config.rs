//! Runtime configuration for API access.
//!
//! Everything here is plain data: a base URL, a timeout, and the client
//! builder that applies them. The base URL is sourced from the
//! `JOBDECK_API_URL` environment variable when present.

use lazy_static::lazy_static;
use std::time::Duration;

/// Default base URL of the aggregator API.
pub const DEFAULT_API_URL: &str = "https://api.jobdeck.app";

/// Environment variable that overrides the API base URL.
pub const API_URL_ENV: &str = "JOBDECK_API_URL";

lazy_static! {
    /// User agent attached to every outgoing request.
    pub static ref USER_AGENT: String = format!("jobdeck/{}", env!("CARGO_PKG_VERSION"));
}

/// Connection settings shared by every client in the crate.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Timeout applied to each request.
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        ApiConfig {
            base_url,
            timeout: Duration::from_secs(30),
        }
    }

    /// Configuration from the environment, falling back to the default URL.
    pub fn from_env() -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => ApiConfig::new(url.trim()),
            _ => ApiConfig::new(DEFAULT_API_URL),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// HTTP client honoring this configuration.
    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT.as_str())
            .build()
            .expect("Failed to create HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ApiConfig::new("http://127.0.0.1:9000");
        assert_eq!(
            config.endpoint("/api/list"),
            "http://127.0.0.1:9000/api/list"
        );
    }

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let config = ApiConfig::new("https://api.example.com//");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(
            config.endpoint("/api/auth/refresh"),
            "https://api.example.com/api/auth/refresh"
        );
    }

    #[test]
    fn test_timeout_override() {
        let config = ApiConfig::new("http://localhost").with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
