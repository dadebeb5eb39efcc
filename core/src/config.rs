//! Client configuration.
//!
//! `ClientConfig` is plain data with serde support so it can be embedded in a
//! host application's own config file, or loaded on its own with
//! `ClientConfig::from_json`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ApiError;
use crate::http::parse_absolute_url;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Limit of `requests` started per window of `window_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests: u32,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

fn default_window_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Absolute URL every request path is joined onto.
    pub base_url: String,
    /// Per-call deadline covering connect, send and receive.
    pub timeout_ms: u64,
    pub user_agent: Option<String>,
    /// Sent with every request unless the request sets the same header.
    pub default_headers: BTreeMap<String, String>,
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: None,
            default_headers: BTreeMap::new(),
            rate_limit: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        let config: ClientConfig = codec::decode(raw.as_bytes())?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_rate_limit(mut self, requests: u32, window: Duration) -> Self {
        self.rate_limit = Some(RateLimitConfig {
            requests,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        });
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL without trailing slashes, ready for `format!("{base}{path}")`.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        parse_absolute_url(&self.base_url)?;
        if self.timeout_ms == 0 {
            return Err(ApiError::Config("timeout_ms must be greater than zero".to_string()));
        }
        if let Some(limit) = &self.rate_limit {
            if limit.requests == 0 {
                return Err(ApiError::Config(
                    "rate_limit.requests must be greater than zero".to_string(),
                ));
            }
            if limit.window_ms == 0 {
                return Err(ApiError::Config(
                    "rate_limit.window_ms must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_fills_defaults() {
        let config = ClientConfig::from_json(r#"{"base_url":"https://ismp.crpt.ru"}"#).unwrap();
        assert_eq!(config.base_url, "https://ismp.crpt.ru");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.rate_limit.is_none());
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn from_json_reads_rate_limit() {
        let config = ClientConfig::from_json(
            r#"{"base_url":"http://localhost:3000","rate_limit":{"requests":5}}"#,
        )
        .unwrap();
        let limit = config.rate_limit.unwrap();
        assert_eq!(limit.requests, 5);
        assert_eq!(limit.window(), Duration::from_secs(1));
    }

    #[test]
    fn from_json_rejects_bad_json() {
        let err = ClientConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ApiError::Codec(_)));
    }

    #[test]
    fn validate_rejects_relative_base_url() {
        let err = ClientConfig::new("localhost:3000/api").validate().unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }

    #[test]
    fn validate_rejects_zero_rate_limit() {
        let config = ClientConfig::default().with_rate_limit(0, Duration::from_secs(1));
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));

        let config = ClientConfig::default().with_rate_limit(1, Duration::ZERO);
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = ClientConfig::default().with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ApiError::Config(_))));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://localhost:3000//");
        assert_eq!(config.trimmed_base_url(), "http://localhost:3000");
    }
}
