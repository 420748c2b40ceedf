//! Pure display helpers: unit conversion, compass points, local times.

use chrono::DateTime;

use crate::types::TemperatureUnit;

const KELVIN_OFFSET: f64 = 273.15;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Round half up, so -0.5 becomes 0 rather than -1.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn to_celsius(kelvin: f64) -> i64 {
    round_half_up(kelvin - KELVIN_OFFSET)
}

pub fn to_fahrenheit(kelvin: f64) -> i64 {
    round_half_up((kelvin - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0)
}

pub fn to_kelvin(kelvin: f64) -> i64 {
    round_half_up(kelvin)
}

/// Convert a Kelvin reading to a whole number in `unit`.
pub fn convert_kelvin(kelvin: f64, unit: TemperatureUnit) -> i64 {
    match unit {
        TemperatureUnit::Celsius => to_celsius(kelvin),
        TemperatureUnit::Fahrenheit => to_fahrenheit(kelvin),
        TemperatureUnit::Kelvin => to_kelvin(kelvin),
    }
}

/// 16-point compass name for a wind direction in degrees. Wraps at 360.
pub fn deg_to_compass(degrees: f64) -> &'static str {
    let index = round_half_up(degrees / 22.5).rem_euclid(16) as usize;
    COMPASS_POINTS[index]
}

/// Granularity for [`format_local`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// Weekday, month and day: `Tue, Nov 14`
    Date,
    /// Hour and minute: `23:13`
    Time,
    /// `Tue, Nov 14 23:13`
    DateTime,
}

impl TimeFormat {
    fn pattern(&self) -> &'static str {
        match self {
            Self::Date => "%a, %b %-d",
            Self::Time => "%H:%M",
            Self::DateTime => "%a, %b %-d %H:%M",
        }
    }
}

/// Wall-clock rendering of a unix timestamp at a place `offset_secs` from UTC.
///
/// Returns an empty string for timestamps chrono cannot represent.
pub fn format_local(timestamp: i64, offset_secs: i64, format: TimeFormat) -> String {
    let shifted = timestamp.saturating_add(offset_secs);
    DateTime::from_timestamp(shifted, 0)
        .map(|dt| dt.format(format.pattern()).to_string())
        .unwrap_or_default()
}

/// Provider icon image for a condition icon code such as `04d`.
pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{}@2x.png", icon)
}

/// Upper-case the first character, leave the rest alone.
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Meters per second to whole kilometers per hour.
pub fn ms_to_kmh(speed: f64) -> i64 {
    round_half_up(speed * 3.6)
}

/// Meters to kilometers with one decimal place, e.g. `10.0`.
pub fn meters_to_km(meters: f64) -> String {
    format!("{:.1}", meters / 1000.0)
}
