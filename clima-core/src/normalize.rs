//! Provider payload → normalized forecast.

use crate::{
    error::{ClimaError, Result},
    model::{
        MAX_UTC_OFFSET, MIN_UTC_OFFSET, NormalizedDay, NormalizedForecast, RawForecastEntry,
        RawForecastResponse, TemperatureRange,
    },
    time_fmt::format_hh_mm,
};

/// Reshape a provider response into the domain forecast.
///
/// Pure and atomic: either every day normalizes or the whole call fails with
/// [`ClimaError::MalformedPayload`]. Sunrise and sunset are rendered in the
/// location's own wall-clock time using `city.timezone`, whichever lookup path
/// produced the payload.
pub fn normalize(raw: &RawForecastResponse) -> Result<NormalizedForecast> {
    let offset = raw.city.timezone;
    if !(MIN_UTC_OFFSET..=MAX_UTC_OFFSET).contains(&offset) {
        return Err(ClimaError::MalformedPayload(format!(
            "utc offset {offset}s is outside {MIN_UTC_OFFSET}..={MAX_UTC_OFFSET}"
        )));
    }

    let days = raw
        .list
        .iter()
        .enumerate()
        .map(|(idx, entry)| normalize_day(idx, entry, offset))
        .collect::<Result<Vec<_>>>()?;

    Ok(NormalizedForecast {
        city: raw.city.name.clone(),
        country: raw.city.country.clone(),
        utc_offset_secs: offset,
        days,
    })
}

/// Decode and normalize a provider body in one step.
pub fn normalize_json(body: &str) -> Result<NormalizedForecast> {
    normalize(&RawForecastResponse::from_json(body)?)
}

fn normalize_day(idx: usize, entry: &RawForecastEntry, offset: i64) -> Result<NormalizedDay> {
    let condition = entry
        .weather
        .first()
        .ok_or_else(|| ClimaError::malformed(format!("list[{idx}].weather[0]")))?;

    let sunrise = format_hh_mm(entry.sunrise, offset)
        .ok_or_else(|| ClimaError::malformed(format!("list[{idx}].sunrise")))?;
    let sunset = format_hh_mm(entry.sunset, offset)
        .ok_or_else(|| ClimaError::malformed(format!("list[{idx}].sunset")))?;

    Ok(NormalizedDay {
        timestamp: entry.dt,
        temperature: TemperatureRange {
            min_c: entry.temp.min,
            max_c: entry.temp.max,
        },
        feels_like_c: entry.feels_like.day,
        humidity_pct: entry.humidity,
        wind_speed_mps: entry.speed,
        condition_id: condition.id,
        description: condition.description.clone(),
        icon: condition.icon.clone(),
        sunrise,
        sunset,
    })
}
