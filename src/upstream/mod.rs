pub mod geocoder;
pub mod restaurants;
pub mod types;
pub mod weather;

pub use geocoder::Geocoder;
pub use restaurants::RestaurantProvider;
pub use weather::WeatherProvider;

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::Config;
use crate::error::{AppError, Result};

/// HTTP transport shared by the three upstream clients.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("CityExplorer/", env!("CARGO_PKG_VERSION")))
            .timeout(config.upstream_timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.upstream_max_retries,
        })
    }

    /// One GET returning the decoded JSON body. Retries only on 429.
    pub async fn get_json(
        &self,
        provider: &'static str,
        url: &str,
        params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<Value> {
        let mut retry_count = 0;
        let mut delay = Duration::from_millis(250);

        loop {
            let mut request = self.client.get(url).query(params);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;

            match response.status() {
                status if status.is_success() => {
                    let json: Value = response.json().await?;
                    return Ok(json);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS if retry_count < self.max_retries => {
                    tracing::warn!(
                        provider,
                        "Rate limited upstream, retrying in {}ms",
                        delay.as_millis()
                    );

                    sleep(delay).await;
                    delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5);
                    retry_count += 1;
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(AppError::Upstream(format!(
                        "{} returned HTTP {}: {}",
                        provider, status, error_text
                    )));
                }
            }
        }
    }
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
