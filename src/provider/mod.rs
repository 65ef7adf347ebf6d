//! Completion gateway abstraction.
//!
//! The conversation loop only sees [`CompletionGateway`]; [`Provider`] is the
//! HTTP implementation for OpenAI-compatible endpoints (OpenRouter by default).

mod client;
pub mod wire;

use async_trait::async_trait;

pub use client::Provider;

use crate::error::Result;
use crate::message::Message;
use crate::tools::ToolSchema;

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Sends the full transcript and the available tools; returns the assistant turn.
    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message>;
}
