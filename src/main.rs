//! Entry point for `mcp-client`, a terminal chat client whose LLM can call
//! the tools of an MCP server.
//!
//! Loads `.env` files (silently ignored if absent), installs logging, parses
//! command-line arguments via [`cli`], and runs the client.

use anyhow::Result;
use mcp_weather::{cli, constants, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init(constants::CLIENT_LOG_FILTER);
    let cli = cli::parse();
    cli::run(cli).await
}
