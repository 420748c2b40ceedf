use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skycast_weather::provider::{DEFAULT_BASE_URL, DEFAULT_CITY, DEFAULT_LANG};
use skycast_weather::{Coordinates, ProviderSettings, TemperatureUnit, Units};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
const UNITS_ENV: &str = "SKYCAST_UNITS";
const LANG_ENV: &str = "SKYCAST_LANG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Weather provider connection
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenWeatherMap key. `OPENWEATHER_API_KEY` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Units for forecast requests
    #[serde(default)]
    pub units: Units,

    #[serde(default = "default_lang")]
    pub lang: String,

    /// City queried when none is selected
    #[serde(default = "default_city")]
    pub default_city: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            units: Units::default(),
            lang: default_lang(),
            default_city: default_city(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("lang", &self.lang)
            .field("default_city", &self.default_city)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the city store snapshot
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skycast")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Device position. Without both coordinates geolocation is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Seconds to wait for a position before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

impl Config {
    /// Load configuration from the default path, creating it if missing,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at {:?}", path);
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged. Returns an error if validation fails.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Overlay values from the environment. `lookup` maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }

        if let Some(units) = lookup(UNITS_ENV) {
            match units.parse::<Units>() {
                Ok(units) => self.provider.units = units,
                Err(e) => tracing::warn!("Ignoring {}: {}", UNITS_ENV, e),
            }
        }

        if let Some(lang) = lookup(LANG_ENV).filter(|l| !l.trim().is_empty()) {
            self.provider.lang = lang.trim().to_string();
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.provider.base_url, "provider.base_url", &mut result);

        let has_key = self
            .provider
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            result.add_warning(
                "provider.api_key",
                format!("No API key configured; set {} or provider.api_key", API_KEY_ENV),
            );
        }

        if self.provider.lang.trim().is_empty() {
            result.add_error("provider.lang", "Language must not be empty");
        }

        if self.provider.default_city.trim().is_empty() {
            result.add_warning("provider.default_city", "No default city configured");
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be between -90 and 90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error(
                        "location.longitude",
                        "Longitude must be between -180 and 180",
                    );
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                result.add_error(
                    "location",
                    "Latitude and longitude must be set together",
                );
            }
            (None, None) => {}
        }

        if self.location.timeout_secs == 0 {
            result.add_error("location.timeout_secs", "Timeout must be greater than 0");
        } else if self.location.timeout_secs > 60 {
            result.add_warning("location.timeout_secs", "Timeout is unusually long (>60s)");
        }

        result
    }

    /// Settings for the weather client
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_key: self.provider.api_key.clone(),
            base_url: self.provider.base_url.clone(),
            units: self.provider.units,
            lang: self.provider.lang.clone(),
            default_city: self.provider.default_city.clone(),
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config_dir>/skycast/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn with_key() -> Config {
        let mut config = Config::default();
        config.provider.api_key = Some("abc123".into());
        config
    }

    #[test]
    fn test_valid_default_config() {
        let result = with_key().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_key_is_warning() {
        let result = Config::default().validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "provider.api_key"));
    }

    #[test]
    fn test_invalid_url() {
        let mut config = with_key();
        config.provider.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "provider.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = with_key();
        config.provider.base_url = "ftp://api.openweathermap.org".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_location_bounds() {
        let mut config = with_key();
        config.location.latitude = Some(91.0);
        config.location.longitude = Some(0.0);
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.latitude"));

        config.location.latitude = Some(5.6);
        config.location.longitude = None;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location"));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = with_key();
        config.location.timeout_secs = 0;
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            units = "imperial"

            [location]
            latitude = 5.556
            longitude = -0.1969

            [display]
            temperature_unit = "fahrenheit"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.units, Units::Imperial);
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.default_city, "Techiman");
        assert_eq!(config.location.timeout_secs, 5);
        assert_eq!(config.location.coordinates(), Some(Coordinates::new(5.556, -0.1969)));
        assert_eq!(config.display.temperature_unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "OPENWEATHER_API_KEY" => Some("from-env".into()),
            "SKYCAST_UNITS" => Some("imperial".into()),
            "SKYCAST_LANG" => Some(" fr ".into()),
            _ => None,
        });

        assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.provider.units, Units::Imperial);
        assert_eq!(config.provider.lang, "fr");
    }

    #[test]
    fn test_bad_units_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "SKYCAST_UNITS").then(|| "furlongs".into()));
        assert_eq!(config.provider.units, Units::Metric);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skycast").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.provider.lang, "en");

        let mut edited = created;
        edited.provider.default_city = "Accra".into();
        edited.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.provider.default_city, "Accra");
    }

    #[test]
    fn test_provider_settings() {
        let settings = with_key().provider_settings();
        assert_eq!(settings.require_api_key().unwrap(), "abc123");
        assert_eq!(settings.default_city, "Techiman");
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", with_key().provider);
        assert!(!rendered.contains("abc123"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
