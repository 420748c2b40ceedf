//! Forward and reverse geocoding through the provider's `/geo/1.0` endpoints.
//! Only the single best candidate is ever requested (`limit=1`).

use async_trait::async_trait;
use tracing::instrument;

use crate::client::{handle_response, WeatherClient};
use crate::error::WeatherError;
use crate::types::{Coordinates, GeoPlace};

/// Turns a coordinate pair into a place name.
///
/// The store depends on this rather than on [`WeatherClient`] directly so it
/// can be exercised without a provider.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<String, WeatherError>;
}

impl WeatherClient {
    /// Resolve a free-text place name to its best candidate.
    ///
    /// Zero candidates is `WeatherError::NoMatch`, not an empty success.
    #[instrument(skip(self), level = "info")]
    pub async fn geocode(&self, place: &str) -> Result<GeoPlace, WeatherError> {
        let place = place.trim();
        if place.is_empty() {
            return Err(WeatherError::InvalidInput("Type a city name".to_string()));
        }
        let api_key = self.settings().require_api_key()?;

        let url = self.endpoint(
            "/geo/1.0/direct",
            &[("q", place), ("limit", "1"), ("appid", api_key)],
        )?;

        let response = self.http().get(url).send().await?;
        let candidates: Vec<GeoPlace> = handle_response(response).await?;

        let best = candidates
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NoMatch(place.to_string()))?;
        tracing::debug!("Geocoded {} to {}, {}", place, best.lat, best.lon);
        Ok(best)
    }

    /// Find the place nearest to a coordinate pair.
    #[instrument(skip(self), level = "info")]
    pub async fn reverse_lookup(&self, coords: Coordinates) -> Result<GeoPlace, WeatherError> {
        if !coords.is_finite() {
            return Err(WeatherError::InvalidInput(
                "Latitude and longitude are required".to_string(),
            ));
        }
        let api_key = self.settings().require_api_key()?;
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();

        let url = self.endpoint(
            "/geo/1.0/reverse",
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", "1"),
                ("appid", api_key),
            ],
        )?;

        let response = self.http().get(url).send().await?;
        let candidates: Vec<GeoPlace> = handle_response(response).await?;

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NoMatch(format!("{}, {}", coords.lat, coords.lon)))
    }
}

#[async_trait]
impl ReverseGeocoder for WeatherClient {
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<String, WeatherError> {
        let place = self.reverse_lookup(coords).await?;
        tracing::info!("Reverse geocoded to: {}", place.name);
        Ok(place.name)
    }
}
