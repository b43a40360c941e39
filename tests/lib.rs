//! Recording fake HTTP client and helpers shared by the behavior tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use findata_core::{
    ApiKey, ClientConfig, HttpClient, HttpError, HttpRequest, HttpResponse, RetryConfig,
    ToolDispatcher,
};
use serde_json::{Map, Value};

pub const TEST_KEY: &str = "test-key-5f2c";
pub const BASE_URL: &str = "https://api.example.test";

/// Replays scripted outcomes in order and records every request it sees.
/// Once the script runs out, the last outcome repeats.
pub struct RecordingHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    last: Mutex<Option<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    pub fn new(script: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always(outcome: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Self::new(vec![outcome])
    }

    pub fn json(body: Value) -> Arc<Self> {
        Self::always(Ok(HttpResponse::ok_json(body.to_string())))
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn next_outcome(&self) -> Result<HttpResponse, HttpError> {
        let mut last = self.last.lock().expect("last lock");
        if let Some(outcome) = self.script.lock().expect("script lock").pop_front() {
            *last = Some(outcome);
        }
        last.clone()
            .unwrap_or_else(|| Err(HttpError::other("no scripted response")))
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("requests lock").push(request);
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}

pub fn config(max_retries: u32) -> ClientConfig {
    ClientConfig::new(ApiKey::new(TEST_KEY).expect("valid key"))
        .with_base_url(BASE_URL)
        .expect("valid base url")
        .with_timeout_ms(1_000)
        .with_retry(RetryConfig::immediate(max_retries))
}

pub fn dispatcher(http: Arc<RecordingHttpClient>) -> ToolDispatcher {
    ToolDispatcher::new(config(2), http)
}

pub fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("arguments must be a JSON object, got {other}"),
    }
}
