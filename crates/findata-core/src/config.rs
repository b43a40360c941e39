//! Client configuration and credential handling.

use std::fmt::{Debug, Formatter};

use crate::error::ConfigError;
use crate::retry::RetryConfig;

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "FINANCIAL_DATASETS_API_KEY";
/// Optional environment override for the upstream base URL.
pub const BASE_URL_ENV: &str = "FINANCIAL_DATASETS_API_BASE";

pub const DEFAULT_BASE_URL: &str = "https://api.financialdatasets.ai";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Upstream API credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Settings shared by every tool call of a dispatcher.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    api_key: ApiKey,
    timeout_ms: u64,
    retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryConfig::default(),
        }
    }

    /// Read the credential (required) and base URL (optional) from the
    /// process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ConfigError::MissingApiKey { name: API_KEY_ENV })?;
        let config = Self::new(ApiKey::new(raw_key)?);

        match std::env::var(BASE_URL_ENV) {
            Ok(base_url) if !base_url.trim().is_empty() => config.with_base_url(base_url),
            _ => Ok(config),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl { value: base_url });
        }
        self.base_url = trimmed.to_owned();
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }
}
