//! Command-line options for the MCP server.
//!
//! # Options
//!
//! | Option | Env | Default | Description |
//! |--------|-----|---------|-------------|
//! | `--base-url` | `FINANCIAL_DATASETS_API_BASE` | `https://api.financialdatasets.ai` | API root |
//! | `--timeout-ms` | `FINDATA_TIMEOUT_MS` | `10000` | Per-attempt timeout |
//! | `--max-retries` | `FINDATA_MAX_RETRIES` | `2` | Retries after the first attempt |
//!
//! The API key is read from `FINANCIAL_DATASETS_API_KEY` only, so it never
//! shows up in process listings.

use clap::Parser;
use findata_core::config::DEFAULT_TIMEOUT_MS;
use findata_core::{ClientConfig, ConfigError, RetryConfig, BASE_URL_ENV};

/// MCP stdio server for the Financial Datasets API.
#[derive(Debug, Parser)]
#[command(name = "findata-mcp", author, version, about)]
pub struct Cli {
    /// Upstream API root URL.
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Per-attempt request timeout in milliseconds.
    #[arg(long, env = "FINDATA_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Retries after the first attempt for transient upstream failures.
    #[arg(long, env = "FINDATA_MAX_RETRIES", default_value_t = 2)]
    pub max_retries: u32,
}

impl Cli {
    /// Apply the flags on top of the environment configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::from_env()?
            .with_timeout_ms(self.timeout_ms)
            .with_retry(RetryConfig::exponential(self.max_retries));
        if let Some(base_url) = self.base_url.as_deref().filter(|url| !url.trim().is_empty()) {
            config = config.with_base_url(base_url)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "findata-mcp",
            "--base-url",
            "http://127.0.0.1:9000",
            "--timeout-ms",
            "2500",
            "--max-retries",
            "0",
        ])
        .expect("valid flags");

        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(cli.timeout_ms, 2_500);
        assert_eq!(cli.max_retries, 0);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Cli::try_parse_from(["findata-mcp", "--timeout-ms", "soon"]).is_err());
    }
}
