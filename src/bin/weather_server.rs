//! MCP weather server speaking JSON-RPC over stdio.
//!
//! Exposes `get_alerts` and `get_forecast` backed by the National Weather
//! Service. Stdout is the protocol channel; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use mcp_weather::mcp::server::serve;
use mcp_weather::weather::{NwsClient, WeatherTools};
use mcp_weather::{constants, logging};
use tokio::io::BufReader;

/// Serve US weather alerts and forecasts to an MCP client over stdio.
#[derive(Parser, Debug)]
#[command(name = "weather-server", version, about)]
struct Args {
    /// Base URL of the NWS API
    #[arg(long, default_value = constants::NWS_API_BASE)]
    api_base: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init(constants::SERVER_LOG_FILTER);
    let args = Args::parse();

    let nws = NwsClient::new(&args.api_base).context("Failed to create NWS client")?;
    let tools = WeatherTools::new(nws);

    tracing::info!(api_base = %args.api_base, "weather server ready on stdio");
    serve(
        &tools,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    tracing::info!("stdin closed, shutting down");
    Ok(())
}
