//! Command-line interface for the MCP chat client.
//!
//! Uses [`clap`] derive macros. The client launches the given server script,
//! connects over stdio, and then either answers a single `--query` or drops
//! into the interactive REPL.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use crate::agent::ConversationLoop;
use crate::chat;
use crate::config::Config;
use crate::mcp::{McpSession, ServerCommand};
use crate::provider::Provider;
use crate::tools::ToolInvoker;

/// Chat with an LLM that can call the tools of an MCP server.
#[derive(Parser, Debug)]
#[command(name = "mcp-client", version, about)]
pub struct Cli {
    /// Server script to launch (.py runs with python, .js with node,
    /// anything else is executed directly)
    pub server: String,

    /// Extra arguments passed through to the server
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub server_args: Vec<String>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum model round-trips per query; 0 disables the limit
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Answer one query and exit instead of starting the REPL
    #[arg(short, long)]
    pub query: Option<String>,
}

/// Parses command-line arguments, exiting the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

impl Cli {
    /// Applies command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(turns) = self.max_turns {
            config.max_turns = Some(turns);
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    cli.apply(&mut config);

    let provider = Provider::from_config(&config)?;

    let command = ServerCommand::from_script(&cli.server, &cli.server_args);
    tracing::info!(%command, "launching tool server");
    let session = McpSession::connect(&command)
        .await
        .with_context(|| format!("failed to connect to server `{}`", command))?;

    let names: Vec<&str> = session.tools().iter().map(|t| t.name.as_str()).collect();
    println!(
        "{} {:?}",
        "Connected to server with tools:".bold().cyan(),
        names
    );

    let outcome = run_session(&cli, &config, &provider, &session).await;

    if let Err(e) = session.close().await {
        tracing::warn!("server shutdown: {e}");
    }
    outcome
}

async fn run_session(
    cli: &Cli,
    config: &Config,
    provider: &Provider,
    session: &McpSession,
) -> Result<()> {
    let invoker = ToolInvoker::new(session, session.tools().to_vec());
    let chat = ConversationLoop::new(provider, invoker)
        .with_system_prompt(config.system_prompt.clone())
        .with_max_turns(config.max_turns());

    match cli.query {
        Some(ref query) => {
            let mut stdout = std::io::stdout();
            if !chat::answer(&chat, query, &mut stdout).await? {
                anyhow::bail!("query failed");
            }
            Ok(())
        }
        None => chat::run_chat(&chat, provider.model()).await,
    }
}
