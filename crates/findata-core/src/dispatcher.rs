//! Single entry point that runs a tool call through the whole pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, Instrument};

use crate::config::{ApiKey, ClientConfig};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::registry::{resolve, TOOLS};
use crate::request_builder::build;
use crate::schema::validate;
use crate::transport::TransportClient;
use crate::{normalizer, ToolError, ToolResult};

/// A tool call as received from the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(alias = "name")]
    pub tool: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

/// Routes tool calls to their pipeline. Cheap to clone and safe to share
/// between concurrent invocations.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    base_url: Arc<str>,
    api_key: ApiKey,
    transport: TransportClient,
}

impl ToolDispatcher {
    pub fn new(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        let transport = TransportClient::new(http, config.timeout_ms(), config.retry().clone());
        Self {
            base_url: Arc::from(config.base_url()),
            api_key: config.api_key().clone(),
            transport,
        }
    }

    /// Dispatcher backed by the reqwest client.
    pub fn from_config(config: ClientConfig) -> Self {
        Self::new(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// `{ name, description, inputSchema }` for every tool, in listing order.
    pub fn list_tools(&self) -> Vec<Value> {
        TOOLS.iter().map(|tool| tool.describe()).collect()
    }

    /// Validate, build, send and normalize one tool call.
    ///
    /// Unknown tools and invalid arguments fail before any network activity.
    pub async fn dispatch(&self, tool_id: &str, args: &Map<String, Value>) -> ToolResult {
        let span = tracing::debug_span!("dispatch", tool = tool_id);
        self.run(tool_id, args).instrument(span).await
    }

    pub async fn dispatch_invocation(&self, invocation: &ToolInvocation) -> ToolResult {
        self.dispatch(&invocation.tool, &invocation.arguments).await
    }

    async fn run(&self, tool_id: &str, args: &Map<String, Value>) -> ToolResult {
        let tool = match resolve(tool_id) {
            Ok(tool) => tool,
            Err(error) => {
                debug!("rejected unknown tool");
                return ToolResult::Failure(error);
            }
        };

        let request = match validate(tool, args) {
            Ok(request) => request,
            Err(error) => {
                debug!(error = %error, "rejected arguments");
                return ToolResult::Failure(error.scoped(tool.name()));
            }
        };
        let Some(ticker) = request.ticker().cloned() else {
            return ToolResult::Failure(ToolError::missing_argument("ticker").scoped(tool.name()));
        };

        let call = build(&request, &self.base_url, &self.api_key);
        let outcome = self.transport.execute(&call).await;
        let result = normalizer::normalize(tool, &ticker, outcome);
        debug!(success = result.is_success(), "tool call finished");
        result
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::registry::ToolId;

    #[test]
    fn dispatcher_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<ToolDispatcher>();
    }

    #[test]
    fn invocation_accepts_name_alias_and_missing_arguments() {
        let invocation: ToolInvocation =
            serde_json::from_value(json!({ "name": "get_news" })).expect("valid invocation");
        assert_eq!(invocation.tool, "get_news");
        assert!(invocation.arguments.is_empty());
    }

    #[test]
    fn lists_every_tool_once() {
        let config = ClientConfig::new(ApiKey::new("k").expect("key"));
        let dispatcher = ToolDispatcher::from_config(config);
        let names: Vec<String> = dispatcher
            .list_tools()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap_or_default().to_owned())
            .collect();
        let expected: Vec<String> = ToolId::ALL.iter().map(|id| id.as_str().to_owned()).collect();
        assert_eq!(names, expected);
    }
}
