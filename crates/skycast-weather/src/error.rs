//! Weather provider and location error types.

use thiserror::Error;

/// Coarse classification used by callers to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider credential or URL is missing or unusable.
    Configuration,
    /// The request never produced a usable response (connect, DNS, timeout, body decode).
    Transport,
    /// The provider answered with an error status or had nothing to return.
    Provider,
    /// The caller passed something that cannot be sent to the provider.
    InvalidInput,
}

/// Weather provider errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Missing weather provider API key (set OPENWEATHER_API_KEY or provider.api_key)")]
    MissingApiKey,

    #[error("Invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    #[error("No match found for: {0}")]
    NoMatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingApiKey | Self::InvalidUrl(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Provider { .. } | Self::NoMatch(_) => ErrorKind::Provider,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// HTTP status reported by the provider, if this is a provider error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the provider had no data for the request (unknown city, empty geocode).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoMatch(_) | Self::Provider { status: 404, .. })
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey => "Weather API key is not configured. Check settings.".to_string(),
            Self::InvalidUrl(_) => "Weather service address is invalid. Check settings.".to_string(),
            Self::Transport(e) if e.is_timeout() => {
                "The weather service timed out. Please try again.".to_string()
            }
            Self::Transport(_) => "Network error. Check your connection.".to_string(),
            Self::Provider { status: 401, .. } => {
                "Weather API key was rejected. Check settings.".to_string()
            }
            Self::Provider { status: 404, .. } | Self::NoMatch(_) => "Data Not Found".to_string(),
            Self::Provider { status, .. } if *status >= 500 => {
                "Weather service unavailable. Please try again later.".to_string()
            }
            Self::Provider { message, .. } => format!("Weather service error: {}", message),
            Self::InvalidInput(msg) => msg.clone(),
        }
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}
