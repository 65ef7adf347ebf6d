pub mod adapter;

use async_trait::async_trait;
use serde_json::Value;

pub use crate::mcp::protocol::{CallToolResult, ContentItem, ToolDescriptor};
pub use adapter::{to_tool_schemas, FunctionSchema, ToolSchema};

use crate::error::{ChatError, Result};

/// A connected source of tools (in practice an MCP session).
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Fetch the advertised tools.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Run a tool and return its structured result.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult>;
}

/// Dispatches tool calls to a provider, restricted to the advertised tools.
pub struct ToolInvoker<'a> {
    provider: &'a dyn ToolProvider,
    tools: Vec<ToolDescriptor>,
}

impl<'a> ToolInvoker<'a> {
    pub fn new(provider: &'a dyn ToolProvider, tools: Vec<ToolDescriptor>) -> Self {
        Self { provider, tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Produce definitions for the LLM (sent in the API request).
    pub fn schemas(&self) -> Vec<ToolSchema> {
        to_tool_schemas(&self.tools)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Fails with [`ChatError::UnknownTool`] unless `name` was advertised.
    pub fn ensure_known(&self, name: &str) -> Result<()> {
        if self.is_known(name) {
            Ok(())
        } else {
            Err(ChatError::UnknownTool(name.to_string()))
        }
    }

    /// Look up a tool by name, execute it, and flatten the result to text.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<String> {
        self.ensure_known(name)?;
        tracing::debug!(tool = name, %arguments, "invoking tool");
        let result = self.provider.call_tool(name, arguments).await?;
        if result.is_error {
            tracing::warn!(tool = name, "tool reported an error");
        }
        Ok(flatten_result(&result))
    }
}

/// Flattens a tool result into one text blob.
///
/// Text parts are joined with newlines; binary and resource parts become
/// short placeholders since only text is fed back to the model.
pub fn flatten_result(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .map(|item| match item {
            ContentItem::Text { text } => text.clone(),
            ContentItem::Image { mime_type, .. } => {
                format!("[image: {}]", mime_type.as_deref().unwrap_or("unknown"))
            }
            ContentItem::Unsupported => "[unsupported content]".to_string(),
            ContentItem::Resource { resource } => {
                match resource.get("text").and_then(Value::as_str) {
                    Some(text) => text.to_string(),
                    None => format!("[resource: {}]", resource),
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
