//! Centralized constants for the MCP client and the weather server.
//!
//! All magic numbers, default strings, and protocol constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "mcp-client";

/// Default LLM model identifier (OpenRouter naming).
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Default OpenAI-compatible chat completion endpoint.
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Environment variable holding the completion endpoint's bearer token.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Maximum tokens for LLM completions. Fixed; not adjustable per call.
pub const MAX_TOKENS: u32 = 1000;

/// Request timeout for the completion endpoint.
pub const COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Default bound on gateway round-trips per query.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "mcp-client.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

/// Log filter used by the client when `RUST_LOG` is unset.
pub const CLIENT_LOG_FILTER: &str = "warn";

/// Log filter used by the weather server when `RUST_LOG` is unset.
pub const SERVER_LOG_FILTER: &str = "info";

/// Input that ends the interactive session (case-insensitive).
pub const QUIT_COMMAND: &str = "quit";

// --- MCP / JSON-RPC ---

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision spoken by both client and server.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// How long a closing MCP server may take to exit before it is killed.
pub const SERVER_SHUTDOWN_GRACE_MS: u64 = 2000;

// --- Weather server ---

/// Server name reported in the MCP `initialize` handshake.
pub const WEATHER_SERVER_NAME: &str = "weather";

/// Base URL of the US National Weather Service API.
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// User agent required by the NWS API.
pub const NWS_USER_AGENT: &str = "weather-app/1.0";

/// Request timeout for NWS API calls.
pub const NWS_TIMEOUT_SECS: u64 = 30;

/// Number of forecast periods included in a forecast.
pub const FORECAST_PERIODS: usize = 5;
