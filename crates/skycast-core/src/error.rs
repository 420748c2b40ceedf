//! Centralized error types for SkyCast.
//!
//! Each crate owns its error enum; [`AppError`] aggregates them so the
//! application edge can show one user-facing message and log the full chain.

use skycast_store::StorageError;
use skycast_weather::{LocationError, WeatherError};
use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for display.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message(),
            AppError::Location(e) => location_message(e).to_string(),
            AppError::Storage(e) => e.user_message().to_string(),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

fn location_message(error: &LocationError) -> &'static str {
    match error {
        LocationError::PermissionDenied => "Location access was denied.",
        LocationError::ServiceUnavailable => "Location is not available on this device.",
        LocationError::Timeout => "Could not determine your location in time.",
        LocationError::Other(_) => "Could not determine your location.",
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_error_conversion() {
        let app_err: AppError = WeatherError::NoMatch("Atlantis".into()).into();
        assert!(matches!(app_err, AppError::Weather(WeatherError::NoMatch(_))));
        assert_eq!(app_err.user_message(), "Data Not Found");
    }

    #[test]
    fn test_location_messages() {
        let app_err: AppError = LocationError::Timeout.into();
        assert!(app_err.user_message().contains("in time"));
    }

    #[test]
    fn test_storage_message_propagation() {
        let app_err = AppError::Storage(StorageError::UnsupportedVersion(7));
        assert_eq!(
            app_err.user_message(),
            "Saved cities come from a newer version and were ignored."
        );
    }

    #[test]
    fn test_config_message_propagation() {
        let app_err = AppError::Config(ConfigError::MissingSetting("provider.api_key".into()));
        assert!(app_err.user_message().contains("required setting"));
        assert!(app_err.to_string().contains("provider.api_key"));
    }
}
