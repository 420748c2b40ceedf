use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::{format_local, TimeFormat};

/// Display unit for temperatures derived from Kelvin readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Suffix shown after a converted value
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
            Self::Kelvin => "K",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
            Self::Kelvin => "kelvin",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            "kelvin" | "k" => Ok(Self::Kelvin),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

/// Geographic coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both components are real numbers (no NaN or infinity)
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// One entry of the provider's `weather` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// `main` block of the current weather payload. Temperatures are Kelvin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<u8>,
    pub sea_level: Option<f64>,
    pub grnd_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Meters per second
    pub speed: Option<f64>,
    /// Meteorological degrees
    pub deg: Option<f64>,
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    /// Cloudiness in percent
    pub all: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Current conditions as returned by `/data/2.5/weather`.
///
/// Kept as the provider sends it; display values are derived on demand
/// (see [`crate::view::CurrentConditions`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub base: Option<String>,
    pub main: Option<MainReadings>,
    /// Meters
    pub visibility: Option<f64>,
    pub wind: Option<Wind>,
    pub clouds: Option<Clouds>,
    /// Observation time, unix seconds
    pub dt: Option<i64>,
    pub sys: Option<SystemInfo>,
    /// Shift from UTC in seconds
    pub timezone: Option<i64>,
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
}

impl CurrentWeather {
    /// First reported condition, if any
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: f64,
    pub min: f64,
    pub max: f64,
    pub night: f64,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFeelsLike {
    pub day: Option<f64>,
    pub night: Option<f64>,
    pub eve: Option<f64>,
    pub morn: Option<f64>,
}

/// One day of the One Call `daily` array. Temperatures follow the requested units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub dt: i64,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub summary: Option<String>,
    pub temp: DailyTemperature,
    pub feels_like: Option<DailyFeelsLike>,
    pub pressure: Option<f64>,
    pub humidity: Option<u8>,
    pub dew_point: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub clouds: Option<u8>,
    /// Probability of precipitation, 0.0 - 1.0
    pub pop: Option<f64>,
    /// Millimeters
    pub rain: Option<f64>,
    pub snow: Option<f64>,
    pub uvi: Option<f64>,
    /// Seconds east of UTC at the forecast location, copied from the envelope
    #[serde(default)]
    pub timezone_offset: i64,
}

impl DailyForecast {
    /// Weekday and date of this entry at the forecast location, e.g. `Wed, Nov 15`.
    pub fn local_date(&self) -> String {
        format_local(self.dt, self.timezone_offset, TimeFormat::Date)
    }

    /// Precipitation probability as a whole percentage
    pub fn precipitation_percent(&self) -> Option<u8> {
        self.pop
            .map(|p| (p.clamp(0.0, 1.0) * 100.0).round() as u8)
    }
}

/// One Call envelope; only the daily section and its UTC offset are used.
#[derive(Debug, Deserialize)]
pub(crate) struct OneCallResponse {
    #[serde(default)]
    pub timezone_offset: i64,
    pub daily: Option<Vec<DailyForecast>>,
}

/// A geocoding candidate from `/geo/1.0/direct` or `/geo/1.0/reverse`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
    pub local_names: Option<HashMap<String, String>>,
}

impl GeoPlace {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// "Name, State, CC" with empty parts left out
    pub fn label(&self) -> String {
        [Some(self.name.as_str()), self.state.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
