use std::sync::Arc;

use skycast_store::{CityStore, FileStorage, StateStorage};
use skycast_weather::{
    CurrentConditions, DailyForecast, FixedLocation, GeoPlace, LocationProvider, NoLocation,
    TemperatureUnit, WeatherClient,
};

use crate::{AppError, Config, ConfigError};

/// Wires configuration, the weather client and the city store together.
pub struct App {
    config: Arc<Config>,
    weather: WeatherClient,
    store: Arc<CityStore>,
}

impl App {
    /// Build the application with a file-backed store under `storage.data_dir`.
    pub fn new(config: Config) -> Result<Self, AppError> {
        if config.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingSetting("storage.data_dir".into()).into());
        }
        let storage = Arc::new(FileStorage::in_dir(&config.storage.data_dir));
        tracing::debug!("City store at {:?}", storage.path());
        Self::with_storage(config, storage)
    }

    /// Build the application over any storage backend.
    pub fn with_storage(config: Config, storage: Arc<dyn StateStorage>) -> Result<Self, AppError> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        let weather = WeatherClient::new(config.provider_settings())?;

        let location: Arc<dyn LocationProvider> = match config.location.coordinates() {
            Some(coords) => Arc::new(FixedLocation::new(coords)),
            None => Arc::new(NoLocation),
        };

        let store = CityStore::new(storage)
            .with_geolocation(location, Arc::new(weather.clone()))
            .with_location_timeout(config.location.timeout());

        tracing::info!("Application initialized");
        Ok(Self {
            config: Arc::new(config),
            weather,
            store: Arc::new(store),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn weather(&self) -> &WeatherClient {
        &self.weather
    }

    pub fn store(&self) -> &Arc<CityStore> {
        &self.store
    }

    /// Unit from the display settings unless the caller overrides it
    pub fn temperature_unit(&self, requested: Option<TemperatureUnit>) -> TemperatureUnit {
        requested.unwrap_or(self.config.display.temperature_unit)
    }

    /// Current conditions for `city`, else the selected city, else the default city.
    pub async fn current_conditions(
        &self,
        city: Option<&str>,
        unit: TemperatureUnit,
    ) -> Result<CurrentConditions, AppError> {
        let city = match city.map(str::trim).filter(|c| !c.is_empty()) {
            Some(city) => city.to_string(),
            None => self.store.city(),
        };

        let weather = self.weather.current_weather(Some(&city)).await?;
        Ok(CurrentConditions::derive(&weather, unit, &city))
    }

    /// Resolve `place` and fetch its daily forecast.
    pub async fn forecast_for(
        &self,
        place: &str,
    ) -> Result<(GeoPlace, Vec<DailyForecast>), AppError> {
        let found = self.weather.geocode(place).await?;
        let days = self.weather.seven_day_forecast(found.coordinates()).await?;
        Ok((found, days))
    }
}
