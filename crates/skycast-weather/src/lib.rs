//! Weather provider access for SkyCast
//!
//! Current conditions, daily forecasts and geocoding over the OpenWeatherMap
//! HTTP API, plus the pure formatting helpers used to turn provider payloads
//! into display values.

pub mod client;
pub mod error;
pub mod format;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;
pub mod view;

pub use client::{ForecastOptions, WeatherClient, FORECAST_DAYS};
pub use error::{ErrorKind, LocationError, WeatherError};
pub use format::{deg_to_compass, format_local, to_celsius, to_fahrenheit, to_kelvin, TimeFormat};
pub use geocode::ReverseGeocoder;
pub use location::{FixedLocation, LocationProvider, NoLocation};
pub use provider::{ProviderSettings, Units};
pub use types::*;
pub use view::CurrentConditions;
