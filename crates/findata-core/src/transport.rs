//! Outbound execution with timeout and bounded retry.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpResponse};
use crate::request_builder::OutboundCall;
use crate::retry::RetryConfig;

/// Failure left over after the retry budget is spent (or retry was not allowed).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The upstream answered with a transient status on every attempt.
    #[error("upstream returned status {} after {attempts} attempt(s)", .response.status)]
    Status {
        response: HttpResponse,
        attempts: u32,
    },
    /// No response was received.
    #[error("{error} after {attempts} attempt(s)")]
    Network { error: HttpError, attempts: u32 },
}

impl TransportFailure {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Status { attempts, .. } | Self::Network { attempts, .. } => *attempts,
        }
    }
}

/// Executes [`OutboundCall`]s. Holds no mutable state; safe to share.
#[derive(Clone)]
pub struct TransportClient {
    http: Arc<dyn HttpClient>,
    timeout_ms: u64,
    retry: RetryConfig,
}

impl std::fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("timeout_ms", &self.timeout_ms)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl TransportClient {
    pub fn new(http: Arc<dyn HttpClient>, timeout_ms: u64, retry: RetryConfig) -> Self {
        Self {
            http,
            timeout_ms,
            retry,
        }
    }

    /// Perform the call, retrying idempotent requests on transient failures.
    ///
    /// Successful and non-retryable responses (including 4xx other than 429)
    /// are returned as `Ok` for the caller to classify.
    pub async fn execute(&self, call: &OutboundCall) -> Result<HttpResponse, TransportFailure> {
        let idempotent = call.method.is_idempotent();
        let mut attempt: u32 = 0;

        loop {
            let attempts = attempt + 1;
            let can_retry = idempotent && attempt < self.retry.max_retries;
            debug!(
                method = call.method.as_str(),
                url = %call.url_with_query(),
                attempt = attempts,
                "sending upstream request"
            );

            match self.attempt(call).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if self.retry.should_retry_status(response.status) => {
                    if !can_retry {
                        return Err(TransportFailure::Status { response, attempts });
                    }
                    warn!(
                        status = response.status,
                        attempt = attempts,
                        "transient upstream status; retrying"
                    );
                }
                Ok(response) => return Ok(response),
                Err(error) => {
                    if !(can_retry && self.is_transient(&error)) {
                        return Err(TransportFailure::Network { error, attempts });
                    }
                    warn!(error = %error, attempt = attempts, "upstream request failed; retrying");
                }
            }

            let delay = self.retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, call: &OutboundCall) -> Result<HttpResponse, HttpError> {
        let request = call.to_http_request(self.timeout_ms);
        // Guard against clients that ignore the per-request timeout.
        let limit = Duration::from_millis(self.timeout_ms);
        match tokio::time::timeout(limit, self.http.execute(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(HttpError::timeout(format!(
                "no response within {}ms",
                self.timeout_ms
            ))),
        }
    }

    fn is_transient(&self, error: &HttpError) -> bool {
        match error.kind() {
            HttpErrorKind::Timeout => self.retry.retry_on_timeout,
            HttpErrorKind::Connect => self.retry.retry_on_connect,
            HttpErrorKind::Other => false,
        }
    }
}
