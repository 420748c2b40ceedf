//! Display-ready values derived from a [`CurrentWeather`] payload.
//!
//! Nothing here is cached: derive again whenever the unit or payload changes.

use serde::Serialize;

use crate::format::{
    convert_kelvin, deg_to_compass, format_local, icon_url, meters_to_km, ms_to_kmh, title_case,
    TimeFormat,
};
use crate::types::{Coordinates, CurrentWeather, TemperatureUnit};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub name: String,
    pub country: Option<String>,
    pub description: String,
    pub icon_url: Option<String>,
    pub unit: TemperatureUnit,
    pub temperature: Option<i64>,
    pub feels_like: Option<i64>,
    pub temp_min: Option<i64>,
    pub temp_max: Option<i64>,
    pub humidity: Option<u8>,
    pub pressure: Option<f64>,
    pub visibility_km: Option<String>,
    pub wind_kmh: Option<i64>,
    pub wind_direction: Option<&'static str>,
    pub gust_kmh: Option<i64>,
    pub cloudiness: Option<u8>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub updated_at: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl CurrentConditions {
    /// Build the view for `weather` in `unit`.
    ///
    /// `requested_city` names the place when the payload has no name.
    pub fn derive(weather: &CurrentWeather, unit: TemperatureUnit, requested_city: &str) -> Self {
        let offset = weather.timezone.unwrap_or(0);
        let local_time = move |ts: i64| format_local(ts, offset, TimeFormat::Time);
        let main = weather.main.as_ref();
        let wind = weather.wind.as_ref();
        let sys = weather.sys.as_ref();
        let condition = weather.condition();

        let name = if weather.name.is_empty() {
            requested_city.trim().to_string()
        } else {
            weather.name.clone()
        };

        Self {
            name,
            country: sys.and_then(|s| s.country.clone()).filter(|c| !c.is_empty()),
            description: condition.map(|c| title_case(&c.description)).unwrap_or_default(),
            icon_url: condition
                .map(|c| c.icon.as_str())
                .filter(|i| !i.is_empty())
                .map(icon_url),
            unit,
            temperature: main.map(|m| convert_kelvin(m.temp, unit)),
            feels_like: main.and_then(|m| m.feels_like).map(|k| convert_kelvin(k, unit)),
            temp_min: main.and_then(|m| m.temp_min).map(|k| convert_kelvin(k, unit)),
            temp_max: main.and_then(|m| m.temp_max).map(|k| convert_kelvin(k, unit)),
            humidity: main.and_then(|m| m.humidity),
            pressure: main.and_then(|m| m.pressure),
            visibility_km: weather.visibility.map(meters_to_km),
            wind_kmh: wind.and_then(|w| w.speed).map(ms_to_kmh),
            wind_direction: wind.and_then(|w| w.deg).map(deg_to_compass),
            gust_kmh: wind.and_then(|w| w.gust).map(ms_to_kmh),
            cloudiness: weather.clouds.as_ref().and_then(|c| c.all),
            sunrise: sys.and_then(|s| s.sunrise).map(local_time),
            sunset: sys.and_then(|s| s.sunset).map(local_time),
            updated_at: weather.dt.map(local_time),
            coordinates: weather.coord,
        }
    }

    /// Temperature with its unit symbol, or `--` when unknown.
    pub fn temperature_label(&self) -> String {
        match self.temperature {
            Some(t) => format!("{}{}", t, self.unit.symbol()),
            None => "--".to_string(),
        }
    }
}
