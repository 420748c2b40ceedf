//! OpenWeatherMap HTTP client: current conditions and daily forecast.
//!
//! Every call is a single request with no retry. Failures come back as
//! [`WeatherError`] values; a failed request never yields a payload.

use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::error::WeatherError;
use crate::provider::{ProviderSettings, Units};
use crate::types::{Coordinates, CurrentWeather, DailyForecast, OneCallResponse};

/// Upper bound on the number of days returned by [`WeatherClient::seven_day_forecast`]
pub const FORECAST_DAYS: usize = 7;

const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));
const FORECAST_EXCLUDE: &str = "minutely,hourly,alerts";

/// Per-call overrides for the forecast request
#[derive(Debug, Clone, Default)]
pub struct ForecastOptions {
    pub units: Option<Units>,
    pub lang: Option<String>,
}

/// Error body the provider sends with non-2xx responses
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    settings: Arc<ProviderSettings>,
}

impl WeatherClient {
    pub fn new(settings: ProviderSettings) -> Result<Self, WeatherError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client: Arc::new(client),
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Fetch current conditions for a city.
    ///
    /// A missing or blank `city` queries the configured default city instead.
    /// The payload is returned exactly as the provider sent it (Kelvin).
    #[instrument(skip(self), level = "info")]
    pub async fn current_weather(&self, city: Option<&str>) -> Result<CurrentWeather, WeatherError> {
        let api_key = self.settings.require_api_key()?;
        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.settings.default_city.as_str());

        let url = self.endpoint(
            "/data/2.5/weather",
            &[("q", city), ("appid", api_key)],
        )?;

        tracing::debug!("Requesting current weather for {}", city);
        let response = self.client.get(url).send().await?;
        handle_response(response).await
    }

    /// Fetch up to seven days of daily forecast using the configured units and language.
    pub async fn seven_day_forecast(
        &self,
        coords: Coordinates,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        self.daily_forecast(coords, &ForecastOptions::default()).await
    }

    /// Fetch the One Call daily forecast, truncated to [`FORECAST_DAYS`] entries.
    ///
    /// Entries keep the provider's order (soonest first). A response without a
    /// `daily` array is an empty forecast, not an error.
    #[instrument(skip(self), level = "info")]
    pub async fn daily_forecast(
        &self,
        coords: Coordinates,
        options: &ForecastOptions,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        if !coords.is_finite() {
            return Err(WeatherError::InvalidInput(
                "Latitude and longitude are required".to_string(),
            ));
        }
        let api_key = self.settings.require_api_key()?;

        let units = options.units.unwrap_or(self.settings.units);
        let lang = options
            .lang
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(self.settings.lang.as_str());
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();

        let url = self.endpoint(
            "/data/2.5/onecall",
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", FORECAST_EXCLUDE),
                ("units", units.as_str()),
                ("lang", lang),
                ("appid", api_key),
            ],
        )?;

        let response = self.client.get(url).send().await?;
        let body: OneCallResponse = handle_response(response).await?;

        let mut daily = body.daily.unwrap_or_default();
        daily.truncate(FORECAST_DAYS);
        for day in &mut daily {
            day.timezone_offset = body.timezone_offset;
        }
        tracing::debug!("Received {} forecast days", daily.len());
        Ok(daily)
    }

    /// Build `{base_url}{path}?{params}` with proper query encoding.
    pub(crate) fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, WeatherError> {
        let base = self.settings.base_url.trim_end_matches('/');
        let url = Url::parse_with_params(&format!("{}{}", base, path), params)?;
        Ok(url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}

/// Decode a success body, or turn an error status into `WeatherError::Provider`.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WeatherError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ProviderErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                trimmed.to_string()
            }
        });

    tracing::debug!("Provider returned {}: {}", status, message);
    Err(WeatherError::Provider {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherClient {
        let settings = ProviderSettings::default()
            .with_api_key("test_key")
            .with_base_url(server.uri());
        WeatherClient::new(settings).unwrap()
    }

    fn daily_entry(dt: i64) -> serde_json::Value {
        serde_json::json!({
            "dt": dt,
            "sunrise": dt - 20000,
            "sunset": dt + 20000,
            "temp": { "day": 21.5, "min": 14.0, "max": 23.1, "night": 15.2, "eve": 19.0, "morn": 14.5 },
            "pressure": 1014,
            "humidity": 60,
            "wind_speed": 3.2,
            "wind_deg": 250,
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
            "clouds": 40,
            "pop": 0.4,
            "uvi": 5.1
        })
    }

    #[tokio::test]
    async fn test_current_weather_accra() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Accra"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "coord": { "lon": -0.1969, "lat": 5.556 },
                "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
                "main": { "temp": 302.15, "humidity": 70 },
                "name": "Accra",
                "cod": 200
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let weather = client.current_weather(Some("Accra")).await.unwrap();

        assert_eq!(weather.name, "Accra");
        // Returned untouched: still Kelvin
        assert_eq!(weather.main.unwrap().temp, 302.15);
    }

    #[tokio::test]
    async fn test_current_weather_defaults_blank_city() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Techiman"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Techiman"
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        assert_eq!(client.current_weather(None).await.unwrap().name, "Techiman");
        assert_eq!(client.current_weather(Some("   ")).await.unwrap().name, "Techiman");
    }

    #[tokio::test]
    async fn test_current_weather_missing_key_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let settings = ProviderSettings::default().with_base_url(mock_server.uri());
        let client = WeatherClient::new(settings).unwrap();
        let result = client.current_weather(Some("Accra")).await;

        let err = result.unwrap_err();
        assert!(matches!(err, WeatherError::MissingApiKey));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_current_weather_rejected_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401,
                "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.current_weather(Some("Accra")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_current_weather_city_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client.current_weather(Some("Nowhereville")).await.unwrap_err();

        match &err {
            WeatherError::Provider { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "city not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_current_weather_unreachable_is_transport() {
        let settings = ProviderSettings::default()
            .with_api_key("test_key")
            .with_base_url("http://127.0.0.1:1");
        let client = WeatherClient::new(settings).unwrap();

        let err = client.current_weather(Some("Accra")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_forecast_truncates_to_seven_in_order() {
        let mock_server = MockServer::start().await;
        let days: Vec<_> = (0..10).map(|i| daily_entry(1_700_000_000 + i * 86_400)).collect();

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .and(query_param("lat", "5.556"))
            .and(query_param("lon", "-0.1969"))
            .and(query_param("exclude", "minutely,hourly,alerts"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "en"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lat": 5.556,
                "lon": -0.1969,
                "timezone": "Africa/Accra",
                "timezone_offset": 0,
                "daily": days
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let forecast = client
            .seven_day_forecast(Coordinates::new(5.556, -0.1969))
            .await
            .unwrap();

        assert_eq!(forecast.len(), FORECAST_DAYS);
        let stamps: Vec<i64> = forecast.iter().map(|d| d.dt).collect();
        let expected: Vec<i64> = (0..7).map(|i| 1_700_000_000 + i * 86_400).collect();
        assert_eq!(stamps, expected);
    }

    #[tokio::test]
    async fn test_forecast_days_carry_location_offset() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "timezone": "Pacific/Tongatapu",
                "timezone_offset": 46800,
                "daily": [daily_entry(1_700_002_800), daily_entry(1_700_089_200)]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let forecast = client
            .seven_day_forecast(Coordinates::new(-21.13, -175.2))
            .await
            .unwrap();

        assert!(forecast.iter().all(|d| d.timezone_offset == 46800));
        assert_eq!(forecast[0].local_date(), "Wed, Nov 15");
        assert_eq!(forecast[1].local_date(), "Thu, Nov 16");
    }

    #[tokio::test]
    async fn test_forecast_short_response_not_padded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": [daily_entry(1_700_000_000), daily_entry(1_700_086_400)]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let forecast = client
            .seven_day_forecast(Coordinates::new(40.7128, -74.006))
            .await
            .unwrap();
        assert_eq!(forecast.len(), 2);
    }

    #[tokio::test]
    async fn test_forecast_without_daily_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lat": 1.0, "lon": 2.0
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let forecast = client
            .seven_day_forecast(Coordinates::new(1.0, 2.0))
            .await
            .unwrap();
        assert!(forecast.is_empty());
    }

    #[tokio::test]
    async fn test_forecast_options_override_units_and_lang() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .and(query_param("units", "imperial"))
            .and(query_param("lang", "fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": [daily_entry(1_700_000_000)]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let options = ForecastOptions {
            units: Some(Units::Imperial),
            lang: Some("fr".to_string()),
        };
        let forecast = client
            .daily_forecast(Coordinates::new(48.85, 2.35), &options)
            .await
            .unwrap();
        assert_eq!(forecast.len(), 1);
    }

    #[tokio::test]
    async fn test_forecast_error_carries_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let err = client
            .seven_day_forecast(Coordinates::new(1.0, 2.0))
            .await
            .unwrap_err();

        match err {
            WeatherError::Provider { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forecast_missing_key_fails_fast() {
        let client = WeatherClient::new(ProviderSettings::default()).unwrap();
        let err = client
            .seven_day_forecast(Coordinates::new(1.0, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_forecast_rejects_non_finite_coordinates() {
        let client = WeatherClient::new(ProviderSettings::default().with_api_key("k")).unwrap();
        let err = client
            .seven_day_forecast(Coordinates::new(f64::NAN, 2.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let settings = ProviderSettings::default().with_base_url("https://example.test/");
        let client = WeatherClient::new(settings).unwrap();
        let url = client
            .endpoint("/data/2.5/weather", &[("q", "São Paulo"), ("appid", "k")])
            .unwrap();
        assert_eq!(url.path(), "/data/2.5/weather");
        assert_eq!(url.host_str(), Some("example.test"));
        assert!(url.as_str().contains("q=S%C3%A3o+Paulo"));
    }
}
