//! Provider connection settings shared by every request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_CITY: &str = "Techiman";
pub const DEFAULT_LANG: &str = "en";

/// Measurement system the provider should answer in (forecast requests only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin, m/s
    Standard,
    /// Celsius, m/s
    #[default]
    Metric,
    /// Fahrenheit, mph
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(format!("unknown units: {}", other)),
        }
    }
}

#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub units: Units,
    pub lang: String,
    /// City queried when the caller passes none
    pub default_city: String,
}

impl ProviderSettings {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The credential, or `MissingApiKey` when unset or blank.
    pub fn require_api_key(&self) -> Result<&str, WeatherError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(WeatherError::MissingApiKey)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: Units::default(),
            lang: DEFAULT_LANG.to_string(),
            default_city: DEFAULT_CITY.to_string(),
        }
    }
}

// Keeps the credential out of logs.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("lang", &self.lang)
            .field("default_city", &self.default_city)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_api_key() {
        let settings = ProviderSettings::default();
        assert!(matches!(settings.require_api_key(), Err(WeatherError::MissingApiKey)));

        let settings = ProviderSettings::default().with_api_key("   ");
        assert!(matches!(settings.require_api_key(), Err(WeatherError::MissingApiKey)));

        let settings = ProviderSettings::default().with_api_key(" abc123 ");
        assert_eq!(settings.require_api_key().ok(), Some("abc123"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = ProviderSettings::default().with_api_key("secret-key");
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_units_parse() {
        assert_eq!("Imperial".parse::<Units>(), Ok(Units::Imperial));
        assert_eq!(Units::default().as_str(), "metric");
        assert!("furlongs".parse::<Units>().is_err());
    }
}
