use serde_json::Value;

use super::types::DailyForecastResponse;
use super::{endpoint, HttpClient};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Forecast;

const PROVIDER: &str = "weather";

/// Daily forecasts from a Weatherbit-compatible endpoint.
pub struct WeatherProvider {
    http: HttpClient,
    url: String,
    api_key: String,
}

impl WeatherProvider {
    pub fn new(http: HttpClient, config: &Config) -> Self {
        Self {
            http,
            url: endpoint(&config.weather_base_url, &config.weather_forecast_path),
            api_key: config.weather_api_key.clone(),
        }
    }

    pub async fn forecast(&self, lat: f64, lon: f64, days: u32) -> Result<Vec<Forecast>> {
        let body = self
            .http
            .get_json(
                PROVIDER,
                &self.url,
                &[
                    ("key", self.api_key.as_str()),
                    ("lat", &lat.to_string()),
                    ("lon", &lon.to_string()),
                    ("days", &days.to_string()),
                ],
                None,
            )
            .await?;

        forecasts_from_response(body)
    }
}

/// One Forecast per element of the provider's `data` array, order preserved.
pub fn forecasts_from_response(body: Value) -> Result<Vec<Forecast>> {
    let response: DailyForecastResponse = serde_json::from_value(body).map_err(|e| {
        AppError::Upstream(format!("malformed {} response: {}", PROVIDER, e))
    })?;

    Ok(response
        .data
        .into_iter()
        .map(|day| Forecast {
            forecast: day.weather.description,
            time: day.datetime,
        })
        .collect())
}
