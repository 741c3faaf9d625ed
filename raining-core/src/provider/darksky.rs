use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;

use crate::forecast::Forecast;

use super::ForecastSource;

/// Fixed query options: SI units, English summaries, and no hourly or
/// minutely blocks since the report never reads them.
const QUERY: [(&str, &str); 3] = [
    ("exclude", "hourly,minutely"),
    ("lang", "en"),
    ("units", "si"),
];

/// Client for the Dark Sky forecast API.
///
/// Requests go to `{base_url}/{api_key}/{latitude},{longitude}`.
#[derive(Clone)]
pub struct DarkSkyClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl DarkSkyClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// The key and coordinates become their own path segments, so any
    /// reserved characters in the key are percent-encoded.
    fn forecast_url(&self, latitude: f64, longitude: f64) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Dark Sky API URL: {}", self.base_url))?;

        url.path_segments_mut()
            .map_err(|_| anyhow!("Dark Sky API URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .push(&self.api_key)
            .push(&format!("{latitude},{longitude}"));

        Ok(url)
    }
}

// The key is part of the request path, so keep it out of debug output.
impl fmt::Debug for DarkSkyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DarkSkyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl ForecastSource for DarkSkyClient {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Option<Forecast>> {
        let res = self
            .http
            .get(self.forecast_url(latitude, longitude)?)
            .query(&QUERY)
            .send()
            .await
            .context("Failed to send request to Dark Sky")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Dark Sky forecast response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Dark Sky forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        // A literal `null` body parses to `None`.
        let parsed: Option<Forecast> =
            serde_json::from_str(&body).context("Failed to parse Dark Sky forecast JSON")?;

        Ok(parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}
