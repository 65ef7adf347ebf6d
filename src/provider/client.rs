//! HTTP client for OpenAI-compatible chat completion endpoints.
//!
//! Contains the [`Provider`] struct, the production [`CompletionGateway`].
//! Every call resends the whole transcript; nothing is cached between calls.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use super::wire::{ChatRequest, ChatResponse, WireMessage};
use super::CompletionGateway;
use crate::config::Config;
use crate::constants::{API_KEY_ENV, COMPLETION_TIMEOUT_SECS, MAX_TOKENS};
use crate::error::{GatewayError, Result};
use crate::message::Message;
use crate::tools::ToolSchema;

/// A configured completion endpoint ready to handle requests.
pub struct Provider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl Provider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> std::result::Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(COMPLETION_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Creates a [`Provider`] from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found or the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key().with_context(|| {
            format!(
                "No API key found. Set {} or configure api_key in config.toml",
                API_KEY_ENV
            )
        })?;
        Self::new(&config.api_url, api_key, &config.model)
            .context("Failed to create completion client")
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for Provider {
    async fn complete(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            max_tokens: MAX_TOKENS,
            tools: (!tools.is_empty()).then_some(tools),
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "completion endpoint returned an error");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response.text().await.map_err(GatewayError::Request)?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;

        if let Some(error) = parsed.error {
            let message = match error.code {
                Some(code) => format!("{} (code {})", error.message, code),
                None => error.message,
            };
            return Err(GatewayError::Api(message).into());
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GatewayError::NoChoices)?;
        tracing::debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            tool_calls = choice.message.tool_calls.as_ref().map_or(0, Vec::len),
            "completion received"
        );

        Ok(Message::try_from(choice.message)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::message::Role;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn forecast_schema() -> Vec<ToolSchema> {
        vec![serde_json::from_value(json!({
            "type": "function",
            "function": {
                "name": "get_forecast",
                "description": "Get weather forecast for a location.",
                "parameters": {"type": "object"}
            }
        }))
        .unwrap()]
    }

    async fn provider_for(server: &MockServer) -> Provider {
        Provider::new(
            format!("{}/v1/chat/completions", server.uri()),
            "test-key",
            "test/model",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sends_transcript_tools_and_max_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("test-key"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "hello"}],
                "tools": [{"type": "function", "function": {"name": "get_forecast"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let reply = provider
            .complete(&[Message::user("hello")], &forecast_schema())
            .await
            .unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text(), "hi there");
        assert!(reply.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn test_omits_tools_when_none_available() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        provider.complete(&[Message::user("hello")], &[]).await.unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_forecast", "arguments": "{\"latitude\":37.35,\"longitude\":-121.95}"}
                    }]
                }, "finish_reason": "tool_calls"}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let reply = provider
            .complete(&[Message::user("weather?")], &forecast_schema())
            .await
            .unwrap();
        assert_eq!(reply.content, None);
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "call_1");
        assert_eq!(reply.tool_calls[0].arguments, json!({"latitude": 37.35, "longitude": -121.95}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_gateway_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.complete(&[Message::user("hi")], &[]).await.unwrap_err();
        match err {
            ChatError::Gateway(GatewayError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_inside_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"message": "upstream overloaded", "code": 502}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.complete(&[Message::user("hi")], &[]).await.unwrap_err();
        assert!(matches!(err, ChatError::Gateway(GatewayError::Api(ref m)) if m.contains("upstream overloaded")));
    }

    #[tokio::test]
    async fn test_empty_choices_and_garbage_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"messages": [{"content": "empty"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"messages": [{"content": "garbage"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.complete(&[Message::user("empty")], &[]).await.unwrap_err();
        assert!(matches!(err, ChatError::Gateway(GatewayError::NoChoices)));

        let err = provider.complete(&[Message::user("garbage")], &[]).await.unwrap_err();
        assert!(matches!(err, ChatError::Gateway(GatewayError::Decode(_))));
    }
}
