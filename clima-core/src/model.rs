use serde::{Deserialize, Serialize};
use std::{fmt, num::NonZeroU32, str::FromStr};

use crate::error::ClimaError;

/// Smallest and largest UTC offsets (in seconds) a real location can have.
pub const MIN_UTC_OFFSET: i64 = -43_200;
pub const MAX_UTC_OFFSET: i64 = 50_400;

/// Number of forecast days requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayCount(NonZeroU32);

impl DayCount {
    pub const DEFAULT: DayCount = match NonZeroU32::new(7) {
        Some(days) => DayCount(days),
        None => unreachable!(),
    };

    pub fn new(days: u32) -> Result<Self, ClimaError> {
        NonZeroU32::new(days)
            .map(Self)
            .ok_or_else(|| ClimaError::InvalidDayCount(days.to_string()))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for DayCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for DayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DayCount {
    type Err = ClimaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or_else(|| ClimaError::InvalidDayCount(trimmed.to_string()))
    }
}

/// A validated latitude/longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ClimaError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ClimaError::InvalidCoordinates(format!(
                "latitude {lat} is outside -90..=90"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ClimaError::InvalidCoordinates(format!(
                "longitude {lon} is outside -180..=180"
            )));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// What the user asked for: a city by name, or a position.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    pub fn city(name: &str) -> Result<Self, ClimaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClimaError::EmptyCity);
        }
        Ok(Self::City(name.to_string()))
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::City(name) => f.write_str(name),
            LocationQuery::Coordinates(c) => write!(f, "{:.4},{:.4}", c.lat, c.lon),
        }
    }
}

// ----- Provider payload (OpenWeather daily forecast) -----

#[derive(Debug, Clone, Deserialize)]
pub struct RawCity {
    pub name: String,
    pub country: String,
    /// Seconds the location is ahead of UTC.
    pub timezone: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTemperature {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFeelsLike {
    pub day: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub id: i64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastEntry {
    pub dt: i64,
    pub temp: RawTemperature,
    pub feels_like: RawFeelsLike,
    pub humidity: u8,
    pub speed: f64,
    pub weather: Vec<RawCondition>,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastResponse {
    pub city: RawCity,
    pub list: Vec<RawForecastEntry>,
}

impl RawForecastResponse {
    /// Decode a provider body. Any absent or mistyped required field is a
    /// [`ClimaError::MalformedPayload`].
    pub fn from_json(body: &str) -> Result<Self, ClimaError> {
        serde_json::from_str(body).map_err(|e| ClimaError::MalformedPayload(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ClimaError> {
        serde_json::from_value(value).map_err(|e| ClimaError::MalformedPayload(e.to_string()))
    }
}

// ----- Normalized domain shape -----

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    #[serde(rename = "minima")]
    pub min_c: f64,
    #[serde(rename = "maxima")]
    pub max_c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDay {
    /// Day timestamp in UTC seconds, kept as the provider sent it.
    #[serde(rename = "data")]
    pub timestamp: i64,
    #[serde(rename = "temperatura")]
    pub temperature: TemperatureRange,
    #[serde(rename = "sensacao")]
    pub feels_like_c: f64,
    #[serde(rename = "umidade")]
    pub humidity_pct: u8,
    #[serde(rename = "vento")]
    pub wind_speed_mps: f64,
    #[serde(rename = "codigo")]
    pub condition_id: i64,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "icone")]
    pub icon: String,
    /// Local `HH:MM` at the forecast location.
    #[serde(rename = "nascerDoSol")]
    pub sunrise: String,
    #[serde(rename = "porDoSol")]
    pub sunset: String,
}

impl NormalizedDay {
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "pais")]
    pub country: String,
    #[serde(rename = "timezone")]
    pub utc_offset_secs: i64,
    /// First entry is today.
    #[serde(rename = "previsao")]
    pub days: Vec<NormalizedDay>,
}

impl NormalizedForecast {
    pub fn today(&self) -> Option<&NormalizedDay> {
        self.days.first()
    }

    /// `City, CC`, dropping whichever part the provider left empty.
    pub fn location_label(&self) -> String {
        match (self.city.is_empty(), self.country.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.country),
            (false, true) => self.city.clone(),
            (true, false) => self.country.clone(),
            (true, true) => "Unnamed location".to_string(),
        }
    }
}
