use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    aggregator::Aggregator,
    error::{AppError, ErrorBody},
    models::{Forecast, Location, Overview, Restaurant},
    query::require,
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

// Every parameter arrives as a raw string so validation goes through AppError.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// City to geocode; case and surrounding whitespace are ignored.
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// City the coordinates belong to; used as the cache key when present.
    pub search_query: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YelpQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// 1-based page number, defaults to 1.
    pub page: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OverviewQuery {
    pub city: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[schema(value_type = String)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    /// `disabled`, `connected` or `unavailable`.
    pub durable_tier: String,
    pub cached_locations: u64,
    pub cached_forecasts: u64,
    /// Absent when entries never expire.
    pub location_cache_ttl_ms: Option<u64>,
    pub forecast_cache_ttl_ms: Option<u64>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_location, get_weather, get_yelp, get_overview),
    components(schemas(
        Location,
        Forecast,
        Restaurant,
        Overview,
        ErrorBody,
        HealthResponse
    ))
)]
pub struct ApiDoc;

// Route handlers
pub async fn root() -> &'static str {
    "City Explorer back-end"
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service status", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let durable_tier = match state.aggregator.durable_tier() {
        None => "disabled",
        Some(store) => match store.health_check().await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!("Durable tier health check failed: {}", e);
                "unavailable"
            }
        },
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        durable_tier: durable_tier.to_string(),
        cached_locations: state.aggregator.cached_locations().await,
        cached_forecasts: state.aggregator.cached_forecasts().await,
        location_cache_ttl_ms: state.aggregator.location_ttl().map(as_millis),
        forecast_cache_ttl_ms: state.aggregator.forecast_ttl().map(as_millis),
    })
}

fn as_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

#[utoipa::path(
    get,
    path = "/location",
    params(LocationQuery),
    responses(
        (status = 200, description = "Geocoded city", body = Location),
        (status = 400, description = "Missing or blank city", body = ErrorBody),
        (status = 500, description = "Geocoder failure", body = ErrorBody)
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<Location>, AppError> {
    let city = require(params.city.as_deref(), "city")?;
    let location = state.aggregator.location(city).await?;
    Ok(Json(location))
}

#[utoipa::path(
    get,
    path = "/weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "Daily forecasts in chronological order", body = [Forecast]),
        (status = 400, description = "Missing or invalid coordinates", body = ErrorBody),
        (status = 500, description = "Weather provider failure", body = ErrorBody)
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<Vec<Forecast>>, AppError> {
    let lat = require(params.latitude.as_deref(), "latitude")?;
    let lon = require(params.longitude.as_deref(), "longitude")?;
    let forecasts = state
        .aggregator
        .forecasts(lat, lon, params.search_query.as_deref())
        .await?;
    Ok(Json(forecasts))
}

#[utoipa::path(
    get,
    path = "/yelp",
    params(YelpQuery),
    responses(
        (status = 200, description = "One page of nearby restaurants, possibly empty", body = [Restaurant]),
        (status = 400, description = "Invalid coordinates or page", body = ErrorBody),
        (status = 500, description = "Restaurant provider failure", body = ErrorBody)
    )
)]
pub async fn get_yelp(
    State(state): State<AppState>,
    Query(params): Query<YelpQuery>,
) -> Result<Json<Vec<Restaurant>>, AppError> {
    let lat = require(params.latitude.as_deref(), "latitude")?;
    let lon = require(params.longitude.as_deref(), "longitude")?;
    let restaurants = state
        .aggregator
        .restaurants(lat, lon, params.page.as_deref())
        .await?;
    Ok(Json(restaurants))
}

#[utoipa::path(
    get,
    path = "/overview",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Location with its forecast and first restaurants page", body = Overview),
        (status = 400, description = "Missing city or invalid page", body = ErrorBody),
        (status = 500, description = "Upstream failure", body = ErrorBody)
    )
)]
pub async fn get_overview(
    State(state): State<AppState>,
    Query(params): Query<OverviewQuery>,
) -> Result<Json<Overview>, AppError> {
    let city = require(params.city.as_deref(), "city")?;
    let overview = state
        .aggregator
        .overview(city, params.page.as_deref())
        .await?;
    Ok(Json(overview))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "notFound": true })))
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/location", get(get_location))
        .route("/weather", get(get_weather))
        .route("/yelp", get(get_yelp))
        .route("/overview", get(get_overview))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
