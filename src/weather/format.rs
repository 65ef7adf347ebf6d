//! Plain-text rendering of NWS alerts and forecast periods.

use serde_json::Value;

/// Separator between formatted alerts or forecast periods.
pub const SEPARATOR: &str = "\n---\n";

/// Renders one alert feature. Missing or null properties fall back to
/// placeholder text.
pub fn format_alert(feature: &Value) -> String {
    let props = &feature["properties"];
    format!(
        "\nEvent: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}\n",
        field_or(props, "event", "Unknown"),
        field_or(props, "areaDesc", "Unknown"),
        field_or(props, "severity", "Unknown"),
        field_or(props, "description", "No description available"),
        field_or(props, "instruction", "No specific instructions provided"),
    )
}

/// Renders one forecast period.
pub fn format_period(period: &Value) -> String {
    format!(
        "\n{}:\nTemperature: {}°{}\nWind: {} {}\nForecast: {}\n",
        field(period, "name"),
        field(period, "temperature"),
        field(period, "temperatureUnit"),
        field(period, "windSpeed"),
        field(period, "windDirection"),
        field(period, "detailedForecast"),
    )
}

fn field_or(value: &Value, key: &str, default: &str) -> String {
    match &value[key] {
        Value::Null => default.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field(value: &Value, key: &str) -> String {
    field_or(value, key, "")
}
