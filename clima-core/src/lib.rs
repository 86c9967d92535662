//! Core library for the `clima` CLI.
//!
//! This crate defines:
//! - The forecast normalizer (provider payload → timezone-correct forecast)
//! - The live clock for the queried location
//! - The query controller tying lookups, normalization and the clock together
//! - Configuration and the OpenWeather provider
//!
//! It is used by `clima-cli`, but can also be reused by other binaries or services.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod time_fmt;

pub use clock::{ClockHandle, ClockSink, LocalClock, SystemTime, TimeSource};
pub use config::Config;
pub use controller::{ClockStatus, QueryController, QueryOutcome};
pub use error::ClimaError;
pub use model::{
    Coordinates, DayCount, LocationQuery, NormalizedDay, NormalizedForecast, RawForecastEntry,
    RawForecastResponse,
};
pub use normalize::{normalize, normalize_json};
pub use provider::{ForecastProvider, openweather::OpenWeatherProvider, provider_from_config};
