use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::{
    error::{ClimaError, Result},
    model::{Coordinates, DayCount, RawForecastResponse},
};

use super::ForecastProvider;

pub const DAILY_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast/daily";

/// Temperatures in Celsius, wind in m/s.
const UNITS: &str = "metric";
/// Condition descriptions are requested in Portuguese.
const LANG: &str = "pt";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DAILY_FORECAST_URL)
    }

    /// Point the provider at another daily-forecast endpoint (a proxy or a
    /// test server).
    pub fn with_base_url(api_key: String, url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            api_key,
            url: url.to_owned(),
            http,
        }
    }

    async fn fetch_daily(
        &self,
        location: &[(&str, String)],
        days: DayCount,
    ) -> Result<RawForecastResponse> {
        let cnt = days.to_string();
        let mut params: Vec<(&str, &str)> = location.iter().map(|(k, v)| (*k, v.as_str())).collect();
        params.extend([
            ("cnt", cnt.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", UNITS),
            ("lang", LANG),
        ]);

        tracing::debug!(url = %self.url, days = days.get(), "Requesting daily forecast");

        let res = self
            .http
            .get(&self.url)
            .query(&params)
            .send()
            .await
            .map_err(|e| unavailable("Failed to send request to OpenWeather", e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| unavailable("Failed to read OpenWeather response body", e))?;

        if !status.is_success() {
            tracing::warn!(%status, "OpenWeather daily forecast request failed");
            return Err(ClimaError::Unavailable(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        RawForecastResponse::from_json(&body)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_by_city(&self, city: &str, days: DayCount) -> Result<RawForecastResponse> {
        self.fetch_daily(&[("q", city.to_owned())], days).await
    }

    async fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
        days: DayCount,
    ) -> Result<RawForecastResponse> {
        self.fetch_daily(
            &[("lat", coords.lat().to_string()), ("lon", coords.lon().to_string())],
            days,
        )
        .await
    }
}

fn unavailable(what: &str, err: reqwest::Error) -> ClimaError {
    tracing::warn!("{}: {}", what, err);
    ClimaError::Unavailable(format!("{what}: {err}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
