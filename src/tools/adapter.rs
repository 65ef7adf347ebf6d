//! Adapter from MCP tool descriptors to the chat-completion function schema.
//!
//! The input schema is forwarded verbatim; argument validation is left to
//! the model and the tool server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ToolDescriptor;

/// `{"type": "function", "function": {...}}` as sent in the `tools` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

impl From<&ToolDescriptor> for ToolSchema {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionSchema {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

/// Converts every descriptor, preserving order.
pub fn to_tool_schemas(tools: &[ToolDescriptor]) -> Vec<ToolSchema> {
    tools.iter().map(ToolSchema::from).collect()
}
