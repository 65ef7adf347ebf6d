//! An MCP chat client and a weather tool server.
//!
//! The client ([`cli`], [`chat`]) launches an MCP server over stdio, exposes
//! its tools to an OpenAI-compatible chat completion endpoint and runs the
//! tool-calling loop in [`agent`]. The server side ([`mcp::server`],
//! [`weather`]) serves National Weather Service alerts and forecasts.

pub mod agent;
pub mod chat;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod logging;
pub mod mcp;
pub mod message;
pub mod provider;
pub mod tools;
pub mod weather;
