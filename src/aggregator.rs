//! Request aggregation: normalize the query, consult the caches, and only
//! fall through to the upstream providers on a miss.

use std::time::Duration;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::database::LocationStore;
use crate::error::Result;
use crate::models::{Forecast, Location, Overview, Restaurant};
use crate::pagination::page_window;
use crate::query::{self, LookupKey};
use crate::upstream::{Geocoder, HttpClient, RestaurantProvider, WeatherProvider};

pub struct Aggregator {
    geocoder: Geocoder,
    weather: WeatherProvider,
    restaurants: RestaurantProvider,
    locations: CacheStore<Location>,
    forecasts: CacheStore<Vec<Forecast>>,
    durable: Option<LocationStore>,
    forecast_days: u32,
    page_size: u32,
}

impl Aggregator {
    pub fn new(config: &Config, durable: Option<LocationStore>) -> Result<Self> {
        let http = HttpClient::new(config)?;

        Ok(Self {
            geocoder: Geocoder::new(http.clone(), config),
            weather: WeatherProvider::new(http.clone(), config),
            restaurants: RestaurantProvider::new(http, config),
            locations: CacheStore::new(
                "locations",
                config.cache_max_capacity,
                config.location_cache_ttl,
            ),
            forecasts: CacheStore::new(
                "forecasts",
                config.cache_max_capacity,
                Some(config.forecast_cache_ttl),
            ),
            durable,
            forecast_days: config.forecast_days,
            page_size: config.restaurants_per_page,
        })
    }

    /// Cache, then durable tier, then geocoder; a geocoded result is written to both.
    pub async fn location(&self, raw_city: &str) -> Result<Location> {
        let key = LookupKey::city(raw_city)?;
        let city = key.as_str().to_string();

        self.locations
            .get_or_try_insert_with(key, self.resolve_location(city))
            .await
    }

    async fn resolve_location(&self, city: String) -> Result<Location> {
        if let Some(store) = &self.durable {
            match store.find(&city).await {
                Ok(Some(location)) => {
                    tracing::debug!("Location {:?} served from durable tier", city);
                    return Ok(location);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Durable tier lookup failed, falling back to geocoder: {}", e)
                }
            }
        }

        let location = self.geocoder.lookup(&city).await?;

        if let Some(store) = &self.durable {
            if let Err(e) = store.insert(&location).await {
                tracing::warn!("Failed to persist location {:?}: {}", city, e);
            }
        }

        Ok(location)
    }

    pub async fn forecasts(
        &self,
        raw_lat: &str,
        raw_lon: &str,
        search_query: Option<&str>,
    ) -> Result<Vec<Forecast>> {
        let (lat, lon) = query::parse_coordinates(raw_lat, raw_lon)?;
        let key = LookupKey::for_forecast(search_query, lat, lon);
        self.forecasts_for(key, lat, lon).await
    }

    async fn forecasts_for(&self, key: LookupKey, lat: f64, lon: f64) -> Result<Vec<Forecast>> {
        self.forecasts
            .get_or_try_insert_with(key, self.weather.forecast(lat, lon, self.forecast_days))
            .await
    }

    /// Always live; restaurant pages are not cached.
    pub async fn restaurants(
        &self,
        raw_lat: &str,
        raw_lon: &str,
        raw_page: Option<&str>,
    ) -> Result<Vec<Restaurant>> {
        let (lat, lon) = query::parse_coordinates(raw_lat, raw_lon)?;
        let page = query::parse_page(raw_page)?;
        self.restaurants_at(lat, lon, page).await
    }

    async fn restaurants_at(&self, lat: f64, lon: f64, page: u32) -> Result<Vec<Restaurant>> {
        let window = page_window(page, self.page_size)?;
        tracing::debug!(
            "Searching restaurants near {},{} (page {}, offset {}, limit {})",
            lat,
            lon,
            page,
            window.offset,
            window.limit
        );
        self.restaurants
            .search(lat, lon, window.offset, window.limit)
            .await
    }

    /// Location first, then forecast and restaurants for it in parallel.
    pub async fn overview(&self, raw_city: &str, raw_page: Option<&str>) -> Result<Overview> {
        let page = query::parse_page(raw_page)?;
        let location = self.location(raw_city).await?;
        let key = LookupKey::City(location.search_query.clone());

        let (forecasts, restaurants) = tokio::try_join!(
            self.forecasts_for(key, location.latitude, location.longitude),
            self.restaurants_at(location.latitude, location.longitude, page),
        )?;

        Ok(Overview {
            location,
            forecasts,
            restaurants,
        })
    }

    pub fn durable_tier(&self) -> Option<&LocationStore> {
        self.durable.as_ref()
    }

    pub async fn cached_locations(&self) -> u64 {
        self.locations.len().await
    }

    pub async fn cached_forecasts(&self) -> u64 {
        self.forecasts.len().await
    }

    pub fn location_ttl(&self) -> Option<Duration> {
        self.locations.ttl()
    }

    pub fn forecast_ttl(&self) -> Option<Duration> {
        self.forecasts.ttl()
    }

    pub async fn shutdown(&self) {
        if let Some(store) = &self.durable {
            store.close().await;
        }
    }
}
