//! Uniform success/failure envelope returned by every tool invocation.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ValidationError;

/// Failure classification surfaced to the calling assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    UnknownTool,
    AuthenticationError,
    RateLimited,
    NotFound,
    UpstreamUnavailable,
    MalformedResponse,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::UnknownTool => "unknown_tool",
            Self::AuthenticationError => "authentication_error",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::MalformedResponse => "malformed_response",
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidArgument => "tool.invalid_argument",
            Self::UnknownTool => "tool.unknown_tool",
            Self::AuthenticationError => "tool.authentication_error",
            Self::RateLimited => "tool.rate_limited",
            Self::NotFound => "tool.not_found",
            Self::UpstreamUnavailable => "tool.upstream_unavailable",
            Self::MalformedResponse => "tool.malformed_response",
        }
    }

    /// Whether the same call may succeed later without changing its input.
    pub const fn retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::UpstreamUnavailable)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured tool failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn invalid_argument(param: &str, error: &ValidationError) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            format!("invalid argument '{param}': {error}"),
        )
    }

    pub fn missing_argument(param: &str) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            format!("missing required argument '{param}'"),
        )
    }

    pub fn unknown_argument(param: &str) -> Self {
        Self::new(
            ErrorKind::InvalidArgument,
            format!("unrecognized argument '{param}'"),
        )
    }

    pub fn unknown_tool(tool_id: &str) -> Self {
        Self::new(ErrorKind::UnknownTool, format!("unknown tool '{tool_id}'"))
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            kind: ErrorKind::RateLimited,
            message: message.into(),
            retry_after,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<u64>) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Prefixes the message with the tool name so the assistant can tell
    /// which call failed.
    pub fn scoped(mut self, tool_name: &str) -> Self {
        if !self.message.starts_with(tool_name) {
            self.message = format!("{tool_name}: {}", self.message);
        }
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Seconds the upstream asked callers to wait, when it said so.
    pub const fn retry_after(&self) -> Option<u64> {
        self.retry_after
    }

    pub fn to_value(&self) -> Value {
        let mut error = json!({
            "kind": self.kind.as_str(),
            "code": self.kind.code(),
            "message": self.message,
            "retryable": self.kind.retryable(),
        });
        if let Some(retry_after) = self.retry_after {
            error["retry_after_secs"] = json!(retry_after);
        }
        json!({ "error": error })
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind.code())
    }
}

impl std::error::Error for ToolError {}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Value),
    Failure(ToolError),
}

impl ToolResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(ToolError::kind)
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure(_) => None,
        }
    }

    /// JSON document handed to the transport layer.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(payload) => payload.clone(),
            Self::Failure(error) => error.to_value(),
        }
    }
}

impl From<Result<Value, ToolError>> for ToolResult {
    fn from(value: Result<Value, ToolError>) -> Self {
        match value {
            Ok(payload) => Self::Success(payload),
            Err(error) => Self::Failure(error),
        }
    }
}
