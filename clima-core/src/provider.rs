use crate::{
    Config,
    error::Result,
    model::{Coordinates, DayCount, LocationQuery, RawForecastResponse},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// A source of raw multi-day forecasts.
///
/// Implementations report transport and HTTP failures as
/// [`ClimaError::Unavailable`](crate::ClimaError::Unavailable) and undecodable
/// bodies as [`ClimaError::MalformedPayload`](crate::ClimaError::MalformedPayload).
/// They never retry.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_by_city(&self, city: &str, days: DayCount) -> Result<RawForecastResponse>;

    async fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
        days: DayCount,
    ) -> Result<RawForecastResponse>;

    async fn fetch(&self, query: &LocationQuery, days: DayCount) -> Result<RawForecastResponse> {
        match query {
            LocationQuery::City(name) => self.fetch_by_city(name, days).await,
            LocationQuery::Coordinates(coords) => self.fetch_by_coordinates(*coords, days).await,
        }
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `clima configure` or set WEATHER_API_KEY."
        )
    })?;

    let provider = match config.base_url.as_deref() {
        Some(url) => OpenWeatherProvider::with_base_url(api_key.to_owned(), url),
        None => OpenWeatherProvider::new(api_key.to_owned()),
    };

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_key_is_set() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            ..Config::default()
        };

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
