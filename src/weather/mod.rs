//! Weather tools backed by the US National Weather Service.
//!
//! [`WeatherTools`] implements [`ToolHandler`] with two tools:
//! `get_alerts` (active alerts for a state) and `get_forecast` (the next
//! few forecast periods for a coordinate). Missing upstream data is reported
//! as ordinary text; only malformed arguments produce an error result.

mod format;
mod nws;

pub use nws::NwsClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::constants::{FORECAST_PERIODS, WEATHER_SERVER_NAME};
use crate::mcp::protocol::{codes, CallToolResult, Implementation, JsonRpcError, ToolDescriptor};
use crate::mcp::server::ToolHandler;

const GET_ALERTS: &str = "get_alerts";
const GET_FORECAST: &str = "get_forecast";

#[derive(Debug, Deserialize)]
struct AlertsArgs {
    state: String,
}

#[derive(Debug, Deserialize)]
struct ForecastArgs {
    latitude: f64,
    longitude: f64,
}

pub struct WeatherTools {
    nws: NwsClient,
}

impl WeatherTools {
    pub fn new(nws: NwsClient) -> Self {
        Self { nws }
    }

    pub async fn get_alerts(&self, state: &str) -> String {
        let Some(data) = self.nws.active_alerts(state).await else {
            return "Unable to fetch alerts or no alerts found.".to_string();
        };
        let Some(features) = data.get("features").and_then(Value::as_array) else {
            return "Unable to fetch alerts or no alerts found.".to_string();
        };
        if features.is_empty() {
            return "No active alerts for this state.".to_string();
        }

        features
            .iter()
            .map(format::format_alert)
            .collect::<Vec<_>>()
            .join(format::SEPARATOR)
    }

    pub async fn get_forecast(&self, latitude: f64, longitude: f64) -> String {
        let forecast_url = self
            .nws
            .point(latitude, longitude)
            .await
            .and_then(|points| points["properties"]["forecast"].as_str().map(String::from));
        let Some(forecast_url) = forecast_url else {
            return "Unable to fetch forecast data for this location.".to_string();
        };

        let forecast = self.nws.get_json(&forecast_url).await;
        let Some(periods) = forecast
            .as_ref()
            .and_then(|f| f["properties"]["periods"].as_array())
        else {
            return "Unable to fetch detailed forecast.".to_string();
        };

        periods
            .iter()
            .take(FORECAST_PERIODS)
            .map(format::format_period)
            .collect::<Vec<_>>()
            .join(format::SEPARATOR)
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments for {tool}: {e}"))
}

#[async_trait]
impl ToolHandler for WeatherTools {
    fn server_info(&self) -> Implementation {
        Implementation {
            name: WEATHER_SERVER_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: GET_ALERTS.to_string(),
                description: Some(
                    "Get weather alerts for a US state.\n\n\
                     Args:\n    state: Two-letter US state code (e.g. CA, NY)"
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "state": {"type": "string", "title": "State"}
                    },
                    "required": ["state"]
                }),
            },
            ToolDescriptor {
                name: GET_FORECAST.to_string(),
                description: Some(
                    "Get weather forecast for a location.\n\n\
                     Args:\n    latitude: Latitude of the location\n    \
                     longitude: Longitude of the location"
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "latitude": {"type": "number", "title": "Latitude"},
                        "longitude": {"type": "number", "title": "Longitude"}
                    },
                    "required": ["latitude", "longitude"]
                }),
            },
        ]
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, JsonRpcError> {
        tracing::info!(tool = name, "tool call");
        let text = match name {
            GET_ALERTS => match parse_args::<AlertsArgs>(name, arguments) {
                Ok(args) => self.get_alerts(&args.state).await,
                Err(msg) => return Ok(CallToolResult::error(msg)),
            },
            GET_FORECAST => match parse_args::<ForecastArgs>(name, arguments) {
                Ok(args) => self.get_forecast(args.latitude, args.longitude).await,
                Err(msg) => return Ok(CallToolResult::error(msg)),
            },
            other => {
                return Err(JsonRpcError::new(
                    codes::INVALID_PARAMS,
                    format!("Unknown tool: {other}"),
                ))
            }
        };
        Ok(CallToolResult::text(text))
    }
}
