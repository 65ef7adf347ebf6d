//! Error taxonomy for the conversation core.
//!
//! The CLI layer works with [`anyhow`]; everything below it (gateway, tool
//! invoker, MCP session, conversation loop) returns [`ChatError`] so callers
//! can tell which collaborator failed. Nothing here is retried.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("completion gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    #[error("tool provider transport: {0}")]
    ProviderTransport(String),

    /// The provider answered with a JSON-RPC error object.
    #[error("tool provider rejected `{method}` ({code}): {message}")]
    ProviderRpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("no final answer after {0} model turns")]
    TurnLimitExceeded(usize),
}

/// Failures talking to the chat completion endpoint.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    /// Some endpoints report errors inside a 200 body.
    #[error("endpoint error: {0}")]
    Api(String),

    #[error("response contained no choices")]
    NoChoices,

    #[error("tool call `{name}` has unparsable arguments: {source}")]
    InvalidArguments {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ChatError {
    pub(crate) fn transport(msg: impl Into<String>) -> Self {
        Self::ProviderTransport(msg.into())
    }
}
