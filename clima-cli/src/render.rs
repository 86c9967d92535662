//! Human-friendly terminal output.

use chrono::DateTime;
use clima_core::{NormalizedDay, NormalizedForecast};

/// Calendar label (`Tue, 14/11`) of a forecast day at the location.
pub fn day_label(day: &NormalizedDay, offset_secs: i64) -> String {
    day.timestamp
        .checked_add(offset_secs)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%a, %d/%m").to_string())
        .unwrap_or_else(|| day.timestamp.to_string())
}

pub fn today_line(forecast: &NormalizedForecast, local_time: Option<&str>) -> String {
    match local_time {
        Some(time) => format!("{} · Hoje, {}", forecast.location_label(), time),
        None => format!("{} · Hoje", forecast.location_label()),
    }
}

pub fn render_forecast(forecast: &NormalizedForecast, local_time: Option<&str>) -> String {
    let mut lines = vec![today_line(forecast, local_time)];

    let Some(today) = forecast.today() else {
        lines.push("  (no forecast days returned)".to_string());
        return lines.join("\n") + "\n";
    };

    lines.push(format!(
        "  {:.1}°C (feels like {:.1}°C) · {} [{}]",
        today.temperature.max_c, today.feels_like_c, today.description, today.condition_id
    ));
    lines.push(format!(
        "  Sunrise {} · Sunset {} · Wind {} m/s · Humidity {}%",
        today.sunrise, today.sunset, today.wind_speed_mps, today.humidity_pct
    ));
    lines.push(format!("  Icon {}", today.icon_url()));

    lines.extend(forecast.days.iter().skip(1).map(|day| {
        format!(
            "  {:<10} {:>5.1}°C | {:>5.1}°C  {:<22} {:>3}%  {:>5} m/s  ☀ {}",
            day_label(day, forecast.utc_offset_secs),
            day.temperature.max_c,
            day.temperature.min_c,
            day.description,
            day.humidity_pct,
            day.wind_speed_mps,
            day.sunrise,
        )
    }));

    lines.join("\n") + "\n"
}
