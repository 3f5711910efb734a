use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub geocoder_api_key: String,
    pub geocoder_base_url: String,
    pub geocoder_search_path: String,
    pub weather_api_key: String,
    pub weather_base_url: String,
    pub weather_forecast_path: String,
    pub forecast_days: u32,
    pub yelp_api_key: String,
    pub yelp_base_url: String,
    pub yelp_search_path: String,
    pub restaurants_per_page: u32,
    pub database_url: Option<String>,
    pub upstream_timeout: Duration,
    pub upstream_max_retries: u32,
    pub forecast_cache_ttl: Duration,
    pub location_cache_ttl: Option<Duration>,
    pub cache_max_capacity: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            port: parse_var("PORT", 3000)?,
            geocoder_api_key: env::var("LOCATION_KEY")
                .map_err(|_| anyhow::anyhow!("LOCATION_KEY not set"))?,
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://us1.locationiq.com".to_string()),
            geocoder_search_path: env::var("GEOCODER_SEARCH_PATH")
                .unwrap_or_else(|_| "/v1/search.php".to_string()),
            weather_api_key: env::var("WEATHER_KEY")
                .map_err(|_| anyhow::anyhow!("WEATHER_KEY not set"))?,
            weather_base_url: env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.weatherbit.io".to_string()),
            weather_forecast_path: env::var("WEATHER_FORECAST_PATH")
                .unwrap_or_else(|_| "/v2.0/forecast/daily".to_string()),
            forecast_days: parse_var("FORECAST_DAYS", 5)?,
            yelp_api_key: env::var("YELP_KEY")
                .map_err(|_| anyhow::anyhow!("YELP_KEY not set"))?,
            yelp_base_url: env::var("YELP_BASE_URL")
                .unwrap_or_else(|_| "https://api.yelp.com".to_string()),
            yelp_search_path: env::var("YELP_SEARCH_PATH")
                .unwrap_or_else(|_| "/v3/businesses/search".to_string()),
            restaurants_per_page: parse_var("RESTAURANTS_PER_PAGE", 4)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            upstream_timeout: Duration::from_millis(parse_var("UPSTREAM_TIMEOUT_MS", 5000)?),
            upstream_max_retries: parse_var("UPSTREAM_MAX_RETRIES", 2)?,
            forecast_cache_ttl: Duration::from_millis(parse_var("FORECAST_CACHE_TTL_MS", 5000)?),
            location_cache_ttl: match env::var("LOCATION_CACHE_TTL_MS") {
                Ok(raw) => Some(Duration::from_millis(parse_value("LOCATION_CACHE_TTL_MS", &raw)?)),
                Err(_) => None,
            },
            cache_max_capacity: parse_var("CACHE_MAX_CAPACITY", 1000)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value: {:?}", name, raw))
}

#[cfg(test)]
impl Config {
    /// Every upstream pointed at one mock server, short timeouts, no durable tier.
    pub fn for_upstream(base_url: &str) -> Self {
        Config {
            port: 0,
            geocoder_api_key: "geo-key".to_string(),
            geocoder_base_url: base_url.to_string(),
            geocoder_search_path: "/v1/search.php".to_string(),
            weather_api_key: "weather-key".to_string(),
            weather_base_url: base_url.to_string(),
            weather_forecast_path: "/v2.0/forecast/daily".to_string(),
            forecast_days: 5,
            yelp_api_key: "yelp-token".to_string(),
            yelp_base_url: base_url.to_string(),
            yelp_search_path: "/v3/businesses/search".to_string(),
            restaurants_per_page: 4,
            database_url: None,
            upstream_timeout: Duration::from_millis(500),
            upstream_max_retries: 0,
            forecast_cache_ttl: Duration::from_millis(5000),
            location_cache_ttl: None,
            cache_max_capacity: 100,
        }
    }
}
