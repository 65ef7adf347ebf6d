//! MCP client session.
//!
//! [`McpSession`] performs the `initialize` handshake, caches the server's
//! tool list, and implements [`ToolProvider`] so the conversation loop can
//! call tools without knowing about JSON-RPC.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeResult, ListToolsResult,
    ToolDescriptor,
};
use super::transport::{ServerCommand, StdioTransport};
use crate::constants::{APP_NAME, MCP_PROTOCOL_VERSION};
use crate::error::{ChatError, Result};
use crate::tools::ToolProvider;

pub struct McpSession {
    transport: StdioTransport,
    server_info: Implementation,
    tools: Vec<ToolDescriptor>,
}

impl McpSession {
    /// Launches the server process and completes the handshake.
    pub async fn connect(command: &ServerCommand) -> Result<Self> {
        let transport = StdioTransport::spawn(command)?;
        Self::handshake(transport).await
    }

    /// Runs `initialize`, `notifications/initialized` and an initial `tools/list`.
    pub async fn handshake(transport: StdioTransport) -> Result<Self> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": APP_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        });
        let init: InitializeResult =
            decode("initialize", transport.request("initialize", Some(params)).await?)?;
        if init.protocol_version != MCP_PROTOCOL_VERSION {
            tracing::warn!(
                server = %init.protocol_version,
                client = MCP_PROTOCOL_VERSION,
                "MCP protocol version mismatch"
            );
        }
        transport.notify("notifications/initialized", None).await?;

        let listed: ListToolsResult =
            decode("tools/list", transport.request("tools/list", None).await?)?;
        tracing::info!(
            server = %init.server_info.name,
            tools = listed.tools.len(),
            "connected to MCP server"
        );

        Ok(Self {
            transport,
            server_info: init.server_info,
            tools: listed.tools,
        })
    }

    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }

    /// Tool list captured at connect time. Descriptors are fixed for the connection.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Closes the connection and reaps the server process.
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }
}

#[async_trait]
impl ToolProvider for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let listed: ListToolsResult =
            decode("tools/list", self.transport.request("tools/list", None).await?)?;
        Ok(listed.tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let params = serde_json::to_value(params)
            .map_err(|e| ChatError::transport(format!("failed to encode tools/call: {}", e)))?;
        decode("tools/call", self.transport.request("tools/call", Some(params)).await?)
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ChatError::transport(format!("invalid `{}` result: {}", method, e)))
}
