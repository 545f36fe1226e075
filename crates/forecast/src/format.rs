//! Renders a [`ForecastOutcome`] as the tool's display text.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::fetcher::ForecastOutcome;
use crate::model::{Coordinate, DayForecast};

/// Returned when upstream answers with no forecast days.
pub const EMPTY_FORECAST_MESSAGE: &str = "No forecast periods available";

const DIVIDER: &str = "---";

/// Render `outcome` for the coordinate that was requested.
///
/// `now` is stamped into the header of a successful forecast.
/// Both the header and the failure text name the coordinate as `<lon>, <lat>`.
pub fn format_forecast<Tz>(
    outcome: &ForecastOutcome,
    coordinate: &Coordinate,
    now: &DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match outcome {
        ForecastOutcome::Unavailable(error) => {
            format!("Failed to retrieve forecast for coordinates: {coordinate}. {error}")
        }
        ForecastOutcome::Empty(_) => EMPTY_FORECAST_MESSAGE.to_string(),
        ForecastOutcome::Ready(response) => {
            let days = response
                .daily
                .iter()
                .map(format_day)
                .collect::<Vec<_>>()
                .join("\n");
            let now = now.to_rfc2822();
            format!("Current time is {now}, forecast for {coordinate}:\n\n{days}")
        }
    }
}

fn format_day(day: &DayForecast) -> String {
    [
        format!("**日期: {}**", day.fx_date),
        format!("温度: {} {}", day.temp_min, day.temp_max),
        format!("风: {} {}", day.wind_dir_day, day.wind_scale_day),
        format!("天气: 白天{}，夜晚{}", day.text_day, day.text_night),
        DIVIDER.to_string(),
    ]
    .join("\n")
}
