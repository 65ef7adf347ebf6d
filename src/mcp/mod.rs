//! Model Context Protocol plumbing.
//!
//! The client side ([`McpSession`] over [`StdioTransport`]) connects the chat
//! client to a tool server; the server side ([`server::serve`]) hosts the
//! weather tools. Both share the JSON-RPC types in [`protocol`].

mod client;
pub mod protocol;
pub mod server;
mod transport;

pub use client::McpSession;
pub use transport::{ServerCommand, StdioTransport};
