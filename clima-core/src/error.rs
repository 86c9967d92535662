use thiserror::Error;

/// Failures surfaced by the core to the query controller and the CLI.
///
/// None of these are retried inside the core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClimaError {
    /// The provider answered, but the payload is missing a required field or
    /// has the wrong shape.
    #[error("could not parse forecast: {0}")]
    MalformedPayload(String),

    /// Network or provider failure upstream of the core.
    #[error("forecast provider unavailable: {0}")]
    Unavailable(String),

    /// The periodic clock timer could not be scheduled.
    #[error("live clock unavailable: {0}")]
    ClockUnavailable(String),

    #[error("invalid day count '{0}': expected a positive whole number")]
    InvalidDayCount(String),

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("city name is required")]
    EmptyCity,
}

impl ClimaError {
    pub(crate) fn malformed(field: impl Into<String>) -> Self {
        Self::MalformedPayload(format!("missing or invalid field `{}`", field.into()))
    }
}

pub type Result<T, E = ClimaError> = std::result::Result<T, E>;
