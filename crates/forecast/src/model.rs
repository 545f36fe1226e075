//! Coordinates and the QWeather 7-day forecast payload.

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoordinateError;

const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;
const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// A validated longitude/latitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    longitude: f64,
    latitude: f64,
}

impl Coordinate {
    /// Validate and build a coordinate. NaN is rejected by both range checks,
    /// and `-0.0` is stored as `0.0`.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CoordinateError> {
        let (longitude, latitude) = (unsigned_zero(longitude), unsigned_zero(latitude));
        if !LONGITUDE_RANGE.contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        if !LATITUDE_RANGE.contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// The upstream `location` parameter: `<lon>,<lat>` at two decimals.
    pub fn location_query(&self) -> String {
        format!("{},{}", fixed2(self.longitude), fixed2(self.latitude))
    }
}

/// Renders as `<lon>, <lat>` with the values as given.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.longitude, self.latitude)
    }
}

fn unsigned_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

/// Format with two decimals, rounding exact ties away from zero.
///
/// `{:.2}` already rounds the exact binary value correctly; the only inputs
/// it resolves differently are exact ties, which for binary doubles are the
/// values where `8 * v` is an odd integer (`0.125`, `-1.375`, ...).
fn fixed2(value: f64) -> String {
    let value = unsigned_zero(value);
    let eighths = value * 8.0;
    let is_tie = eighths.fract() == 0.0 && eighths % 2.0 != 0.0;
    if !is_tie {
        return format!("{value:.2}");
    }

    let hundredths = (value.abs() * 100.0 + 0.5).floor() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Parsed `GET /v7/weather/7d` response.
///
/// Every field is optional on the wire; absent values come back empty so a
/// partial payload still renders. Text fields take any scalar: `null` becomes
/// empty and numbers or booleans keep their JSON spelling.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForecastResponse {
    #[serde(deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub update_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fx_link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub daily: Vec<DayForecast>,
    pub refer: Option<Refer>,
}

/// Data source and license attribution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Refer {
    #[serde(deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub license: Vec<String>,
}

/// One calendar day. Values are display strings, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DayForecast {
    #[serde(deserialize_with = "lenient_string")]
    pub fx_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub sunrise: String,
    #[serde(deserialize_with = "lenient_string")]
    pub sunset: String,
    #[serde(deserialize_with = "lenient_string")]
    pub moonrise: String,
    #[serde(deserialize_with = "lenient_string")]
    pub moonset: String,
    #[serde(deserialize_with = "lenient_string")]
    pub moon_phase: String,
    #[serde(deserialize_with = "lenient_string")]
    pub moon_phase_icon: String,
    #[serde(deserialize_with = "lenient_string")]
    pub temp_max: String,
    #[serde(deserialize_with = "lenient_string")]
    pub temp_min: String,
    #[serde(deserialize_with = "lenient_string")]
    pub icon_day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub text_day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub icon_night: String,
    #[serde(deserialize_with = "lenient_string")]
    pub text_night: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind360_day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_dir_day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_scale_day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_speed_day: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind360_night: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_dir_night: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_scale_night: String,
    #[serde(deserialize_with = "lenient_string")]
    pub wind_speed_night: String,
    #[serde(deserialize_with = "lenient_string")]
    pub humidity: String,
    #[serde(deserialize_with = "lenient_string")]
    pub precip: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pressure: String,
    #[serde(deserialize_with = "lenient_string")]
    pub vis: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cloud: String,
    #[serde(deserialize_with = "lenient_string")]
    pub uv_index: String,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(LenientString)
}

/// Accepts any JSON value where display text is expected.
///
/// Arrays and objects are skipped and read as empty.
struct LenientString;

impl<'de> Visitor<'de> for LenientString {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<String, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(String::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<String, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(String::new())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
