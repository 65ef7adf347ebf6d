//! HTTP client for the National Weather Service API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::constants::{NWS_TIMEOUT_SECS, NWS_USER_AGENT};

/// Fetches GeoJSON documents from the NWS API.
///
/// Every failure (network, non-2xx status, undecodable body) is logged and
/// collapsed into `None`; the tools report "no data" rather than an error.
#[derive(Clone)]
pub struct NwsClient {
    client: Client,
    base_url: String,
}

impl NwsClient {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(NWS_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(NWS_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `{base}/alerts/active/area/{state}`, with `state` escaped as a single
    /// path segment.
    pub async fn active_alerts(&self, state: &str) -> Option<Value> {
        let url = self.endpoint(&["alerts", "active", "area", state])?;
        self.get_json(url.as_str()).await
    }

    /// `{base}/points/{latitude},{longitude}`
    pub async fn point(&self, latitude: f64, longitude: f64) -> Option<Value> {
        let point = format!("{},{}", latitude, longitude);
        let url = self.endpoint(&["points", &point])?;
        self.get_json(url.as_str()).await
    }

    fn endpoint(&self, segments: &[&str]) -> Option<Url> {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(base = %self.base_url, "invalid NWS base URL: {e}");
                return None;
            }
        };
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(segments);
        Some(url)
    }

    /// GET an absolute URL, such as the forecast link returned by [`Self::point`].
    pub async fn get_json(&self, url: &str) -> Option<Value> {
        tracing::debug!(%url, "nws request");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, "nws request failed: {e}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "nws returned an error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(%url, "nws body was not JSON: {e}");
                None
            }
        }
    }
}
