//! Newline-delimited JSON-RPC 2.0 over stdio, speaking the MCP tool subset.

use findata_core::{ToolDispatcher, ToolInvocation, ToolResult};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::error::ServerError;

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "findata-mcp";

#[derive(Debug, Clone, PartialEq, Eq)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
        }
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
        }
    }
}

pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve until the reader reaches end of input and every pending tool
    /// call has been answered.
    ///
    /// Tool calls run as separate tasks, so their replies may arrive out of
    /// request order. Every other request is answered in the order it was read.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = MCP_SERVER_NAME, "serving tools over stdio");
        let mut lines = reader.lines();
        let (replies, mut outbox) = mpsc::unbounded_channel::<Value>();
        let mut replies = Some(replies);

        loop {
            tokio::select! {
                line = lines.next_line(), if replies.is_some() => match line? {
                    Some(line) => {
                        if let Some(sender) = &replies {
                            self.handle_line(&line, sender);
                        }
                    }
                    None => {
                        info!("input closed; draining pending tool calls");
                        replies = None;
                    }
                },
                reply = outbox.recv() => {
                    let Some(reply) = reply else { break };
                    let mut frame = serde_json::to_vec(&reply)?;
                    frame.push(b'\n');
                    writer.write_all(&frame).await?;
                    writer.flush().await?;
                }
            }
        }

        info!("shutting down");
        Ok(())
    }

    fn handle_line(&self, line: &str, replies: &UnboundedSender<Value>) {
        if line.trim().is_empty() {
            return;
        }
        let reply = match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message, replies),
            Err(err) => {
                warn!(error = %err, "unparsable frame");
                Some(error_response(
                    Value::Null,
                    RpcError::parse_error(format!("Parse error: {err}")),
                ))
            }
        };
        if let Some(reply) = reply {
            send_reply(replies, reply);
        }
    }

    fn handle_message(
        &self,
        message: Value,
        replies: &UnboundedSender<Value>,
    ) -> Option<Value> {
        let Some(obj) = message.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        let id = obj.get("id").cloned();
        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return Some(error_response(
                id.unwrap_or(Value::Null),
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // Responses to requests we never send.
            if obj.contains_key("result") || obj.contains_key("error") {
                debug!("ignoring client response");
                return None;
            }
            return Some(error_response(
                id.unwrap_or(Value::Null),
                RpcError::invalid_request("Request must include a string 'method'"),
            ));
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        let Some(id) = id else {
            debug!(method, "ignoring notification");
            return None;
        };

        let result = match method {
            "initialize" => Ok(initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.dispatcher.list_tools() })),
            "tools/call" => match tool_invocation(params) {
                Ok(invocation) => {
                    self.spawn_tool_call(id, invocation, replies);
                    return None;
                }
                Err(err) => Err(err),
            },
            _ => Err(RpcError::method_not_found(method)),
        };

        Some(match result {
            Ok(result) => success_response(id, result),
            Err(err) => error_response(id, err),
        })
    }

    fn spawn_tool_call(
        &self,
        id: Value,
        invocation: ToolInvocation,
        replies: &UnboundedSender<Value>,
    ) {
        let dispatcher = self.dispatcher.clone();
        let replies = replies.clone();
        tokio::spawn(async move {
            let result = dispatcher.dispatch_invocation(&invocation).await;
            send_reply(&replies, success_response(id, tool_call_payload(&result)));
        });
    }
}

fn send_reply(replies: &UnboundedSender<Value>, reply: Value) {
    if replies.send(reply).is_err() {
        debug!("reply dropped after shutdown");
    }
}

fn tool_invocation(params: Value) -> Result<ToolInvocation, RpcError> {
    let params = params
        .as_object()
        .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

    let arguments = match params.get("arguments") {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(_) => {
            return Err(RpcError::invalid_params(
                "tools/call field 'arguments' must be an object",
            ))
        }
    };

    Ok(ToolInvocation::new(name, arguments))
}

fn initialize_payload() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": MCP_SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn tool_call_payload(result: &ToolResult) -> Value {
    let structured = result.to_value();
    let text = serde_json::to_string_pretty(&structured).unwrap_or_else(|_| structured.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
        "isError": !result.is_success(),
    })
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    })
}
