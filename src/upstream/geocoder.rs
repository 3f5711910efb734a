use serde_json::Value;

use super::types::GeocodeHit;
use super::{endpoint, HttpClient};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Location;

const PROVIDER: &str = "geocoder";

/// Forward geocoding against a LocationIQ-compatible search endpoint.
pub struct Geocoder {
    http: HttpClient,
    url: String,
    api_key: String,
}

impl Geocoder {
    pub fn new(http: HttpClient, config: &Config) -> Self {
        Self {
            http,
            url: endpoint(&config.geocoder_base_url, &config.geocoder_search_path),
            api_key: config.geocoder_api_key.clone(),
        }
    }

    /// `city` must already be normalized; it becomes the Location's `search_query`.
    pub async fn lookup(&self, city: &str) -> Result<Location> {
        tracing::debug!("Geocoding {:?}", city);
        let body = self
            .http
            .get_json(
                PROVIDER,
                &self.url,
                &[("key", self.api_key.as_str()), ("q", city), ("format", "json")],
                None,
            )
            .await?;

        location_from_response(city, body)
    }
}

/// Builds a Location from the first hit of a geocoder result list.
///
/// Only the first hit is decoded; later entries may be in any shape.
pub fn location_from_response(search_query: &str, body: Value) -> Result<Location> {
    let malformed =
        |e: serde_json::Error| AppError::Upstream(format!("malformed {} response: {}", PROVIDER, e));

    let hits: Vec<Value> = serde_json::from_value(body).map_err(malformed)?;
    let first = hits.into_iter().next().ok_or_else(|| {
        AppError::Upstream(format!("{} returned no results for {:?}", PROVIDER, search_query))
    })?;
    let first: GeocodeHit = serde_json::from_value(first).map_err(malformed)?;

    Ok(Location {
        search_query: search_query.to_string(),
        formatted_query: first.display_name,
        latitude: first.lat.to_f64("lat")?,
        longitude: first.lon.to_f64("lon")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_location_from_response() {
        let body = json!([
            {"display_name": "Seattle, WA", "lat": "47.6", "lon": "-122.3", "importance": 0.9},
            {"display_name": "Seattle, Some Other Place", "lat": "1.0", "lon": "2.0"}
        ]);

        let location = location_from_response("seattle", body).unwrap();

        assert_eq!(
            location,
            Location {
                search_query: "seattle".to_string(),
                formatted_query: "Seattle, WA".to_string(),
                latitude: 47.6,
                longitude: -122.3,
            }
        );
    }

    #[test]
    fn test_zero_results_is_upstream_error() {
        let err = location_from_response("atlantis", json!([])).unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_missing_fields_is_upstream_error() {
        let err = location_from_response("seattle", json!([{"display_name": "Seattle"}]))
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));

        let err = location_from_response("seattle", json!({"error": "Unable to geocode"}))
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_malformed_later_hit_is_ignored() {
        let body = json!([
            {"display_name": "Seattle, WA", "lat": "47.6", "lon": "-122.3"},
            {"display_name": "x", "lat": null, "lon": "2.0"}
        ]);

        let location = location_from_response("seattle", body).unwrap();

        assert_eq!(location.formatted_query, "Seattle, WA");
        assert_eq!(location.latitude, 47.6);
        assert_eq!(location.longitude, -122.3);
    }

    #[test]
    fn test_non_numeric_coordinate_is_parse_error() {
        let body = json!([{"display_name": "Seattle, WA", "lat": "north", "lon": "-122.3"}]);
        let err = location_from_response("seattle", body).unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_lookup_queries_provider() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search.php"))
            .and(query_param("key", "geo-key"))
            .and(query_param("q", "seattle"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"display_name": "Seattle, WA", "lat": "47.6", "lon": "-122.3"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config::for_upstream(&mock_server.uri());
        let geocoder = Geocoder::new(HttpClient::new(&config).unwrap(), &config);

        let location = geocoder.lookup("seattle").await.unwrap();
        assert_eq!(location.formatted_query, "Seattle, WA");
    }
}
