use serde_json::Value;

use super::types::BusinessSearchResponse;
use super::{endpoint, HttpClient};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Restaurant;

const PROVIDER: &str = "yelp";

/// Business search against a Yelp-compatible endpoint, authenticated with a bearer token.
pub struct RestaurantProvider {
    http: HttpClient,
    url: String,
    token: String,
}

impl RestaurantProvider {
    pub fn new(http: HttpClient, config: &Config) -> Self {
        Self {
            http,
            url: endpoint(&config.yelp_base_url, &config.yelp_search_path),
            token: config.yelp_api_key.clone(),
        }
    }

    pub async fn search(
        &self,
        lat: f64,
        lon: f64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Restaurant>> {
        let body = self
            .http
            .get_json(
                PROVIDER,
                &self.url,
                &[
                    ("latitude", &lat.to_string()),
                    ("longitude", &lon.to_string()),
                    ("limit", &limit.to_string()),
                    ("offset", &offset.to_string()),
                ],
                Some(self.token.as_str()),
            )
            .await?;

        restaurants_from_response(body)
    }
}

/// An empty `businesses` array is a valid page with no matches.
pub fn restaurants_from_response(body: Value) -> Result<Vec<Restaurant>> {
    let response: BusinessSearchResponse = serde_json::from_value(body).map_err(|e| {
        AppError::Upstream(format!("malformed {} response: {}", PROVIDER, e))
    })?;

    Ok(response
        .businesses
        .into_iter()
        .map(|business| Restaurant {
            name: business.name,
            url: business.url,
            rating: business.rating.unwrap_or_default(),
            price: business.price.unwrap_or_default(),
            image_url: business.image_url.unwrap_or_default(),
        })
        .collect())
}
