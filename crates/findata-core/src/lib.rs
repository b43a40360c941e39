//! # Findata Core
//!
//! Tool-dispatch core for the Financial Datasets market-data API.
//!
//! ## Overview
//!
//! An assistant names a tool and passes loosely-typed JSON arguments. The
//! dispatcher validates them, builds one authenticated GET against the
//! upstream API, executes it with a timeout and bounded retry, and reshapes
//! the payload into a stable result:
//!
//! - **Tool registry** with six read-only tools (statements, prices, news)
//! - **Parameter schema** coercing arguments into domain values
//! - **Transport** with injectable HTTP client and retry policy
//! - **Normalizer** classifying every outcome into a [`ToolResult`]
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Client configuration and credential |
//! | [`dispatcher`] | Tool dispatcher entry point |
//! | [`domain`] | Domain values (Ticker, CalendarDate, PriceBar) |
//! | [`error`] | Validation and configuration errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalizer`] | Upstream outcome classification |
//! | [`registry`] | Tool table |
//! | [`request_builder`] | Outbound call construction |
//! | [`result`] | Success/failure envelope |
//! | [`retry`] | Retry and backoff policy |
//! | [`schema`] | Parameter validation |
//! | [`transport`] | Timeout and retry execution |
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────┐
//! │ ToolDispatcher  │  unknown tool ──▶ Failure(UnknownTool)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ schema::validate│  bad input ─────▶ Failure(InvalidArgument)
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ request_builder │────▶│ TransportClient  │
//! └─────────────────┘     │ (HttpClient)     │
//!                         └────────┬─────────┘
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ normalizer       │──▶ ToolResult
//!                         └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use findata_core::{ClientConfig, ToolDispatcher};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = ToolDispatcher::from_config(ClientConfig::from_env()?);
//!     let args = json!({ "ticker": "AAPL" });
//!     let result = dispatcher
//!         .dispatch("get_current_price", args.as_object().expect("object"))
//!         .await;
//!     println!("{}", result.to_value());
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! - The API key travels only in the `X-API-KEY` header
//! - `Debug` output of configuration and requests never includes it

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalizer;
pub mod registry;
pub mod request_builder;
pub mod result;
pub mod retry;
pub mod schema;
pub mod transport;

// Configuration
pub use config::{ApiKey, ClientConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};

// Dispatcher
pub use dispatcher::{ToolDispatcher, ToolInvocation};

// Domain models
pub use domain::{CalendarDate, Period, PriceBar, PriceInterval, PriceSeries, PriceSnapshot, Ticker};

// Error types
pub use error::{ConfigError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Tool table
pub use registry::{resolve, tool_definition, ResponseShape, ToolDefinition, ToolId, TOOLS};

// Outbound calls
pub use request_builder::{OutboundCall, API_KEY_HEADER};

// Results
pub use result::{ErrorKind, ToolError, ToolResult};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Validation
pub use schema::{validate, ParamSpec, ParamType, ParamValue, ValidatedRequest};

// Transport
pub use transport::{TransportClient, TransportFailure};
