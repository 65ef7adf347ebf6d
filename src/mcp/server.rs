//! Minimal MCP server loop over newline-delimited JSON-RPC.
//!
//! A [`ToolHandler`] supplies the tools; [`serve`] owns the framing and
//! method dispatch. The loop is generic over the reader and writer so it runs
//! against process stdio in production and in-memory buffers in tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::protocol::{
    codes, CallToolParams, CallToolResult, Implementation, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ToolDescriptor,
};
use crate::constants::MCP_PROTOCOL_VERSION;

/// Tools exposed by a server.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name and version reported during `initialize`.
    fn server_info(&self) -> Implementation;

    fn tools(&self) -> Vec<ToolDescriptor>;

    /// Runs a tool. Execution failures belong in the result (`is_error`);
    /// an `Err` is reserved for protocol-level problems such as an unknown tool.
    async fn call_tool(&self, name: &str, arguments: Value)
        -> Result<CallToolResult, JsonRpcError>;
}

/// Serves requests until the reader reaches EOF.
pub async fn serve<R, W>(
    handler: &dyn ToolHandler,
    mut reader: R,
    mut writer: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(handler, line.trim()).await,
            Err(e) => {
                tracing::warn!(error = %e, "message is not valid UTF-8");
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(codes::PARSE_ERROR, format!("parse error: {}", e)),
                ))
            }
        };
        if let Some(response) = response {
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
    }
    tracing::info!("client closed the connection");
    Ok(())
}

/// Produces the response for one incoming line, or `None` for notifications.
async fn handle_line(handler: &dyn ToolHandler, line: &str) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable message");
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::new(codes::PARSE_ERROR, format!("parse error: {}", e)),
            ));
        }
    };

    // Responses to requests we never send.
    if value.get("method").is_none() {
        tracing::debug!("ignoring message without a method");
        return None;
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::new(codes::INVALID_REQUEST, format!("invalid request: {}", e)),
            ))
        }
    };

    let Some(id) = request.id.clone() else {
        tracing::debug!(method = %request.method, "notification");
        return None;
    };

    tracing::debug!(%id, method = %request.method, "request");
    Some(match dispatch(handler, &request).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    })
}

async fn dispatch(
    handler: &dyn ToolHandler,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    match request.method.as_str() {
        "initialize" => {
            let requested = request
                .params
                .as_ref()
                .and_then(|p| p.get("protocolVersion"))
                .and_then(Value::as_str)
                .unwrap_or(MCP_PROTOCOL_VERSION);
            tracing::info!(client_version = requested, "initialize");
            Ok(json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": handler.server_info(),
            }))
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": handler.tools() })),
        "tools/call" => {
            let params: CallToolParams = request
                .params
                .clone()
                .ok_or_else(|| JsonRpcError::new(codes::INVALID_PARAMS, "missing params"))
                .and_then(|p| {
                    serde_json::from_value(p).map_err(|e| {
                        JsonRpcError::new(codes::INVALID_PARAMS, format!("invalid params: {}", e))
                    })
                })?;
            tracing::info!(tool = %params.name, "tools/call");
            let result = handler.call_tool(&params.name, params.arguments).await?;
            serde_json::to_value(result)
                .map_err(|e| JsonRpcError::new(codes::INVALID_REQUEST, e.to_string()))
        }
        other => Err(JsonRpcError::new(
            codes::METHOD_NOT_FOUND,
            format!("method not found: {}", other),
        )),
    }
}
