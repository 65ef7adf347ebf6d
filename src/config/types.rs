//! Struct definitions and serde defaults for client configuration.

use serde::{Deserialize, Serialize};

/// Root configuration, deserialized from `config.toml`.
///
/// Fields use serde defaults so the client runs with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Model identifier sent to the completion endpoint.
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI-compatible chat completions URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token. The `OPENROUTER_API_KEY` environment variable wins over this.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Bound on model round-trips per query. `0` disables the bound.
    #[serde(default)]
    pub max_turns: Option<usize>,
    /// Optional system prompt prepended to every query.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

pub(super) fn default_api_url() -> String {
    crate::constants::DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_url: default_api_url(),
            api_key: None,
            max_turns: None,
            system_prompt: None,
        }
    }
}
