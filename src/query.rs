//! Canonical lookup keys built from raw query parameters.
//!
//! The same normalization feeds both the in-process caches and the durable
//! tier, so a key that hits one can never silently miss the other.

use std::fmt;

use crate::error::{AppError, Result};

/// Decimal places kept when a coordinate pair becomes a cache key.
pub const COORDINATE_PRECISION: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// Normalized city string, identical to the durable tier's `search_query`.
    City(String),
    /// Coordinate pair rounded to [`COORDINATE_PRECISION`] places.
    Coordinates(String),
}

impl LookupKey {
    pub fn city(raw: &str) -> Result<Self> {
        normalize_city(raw).map(LookupKey::City)
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        let precision = COORDINATE_PRECISION as usize;
        LookupKey::Coordinates(format!(
            "{:.*},{:.*}",
            precision,
            round_to_decimals(lat, COORDINATE_PRECISION),
            precision,
            round_to_decimals(lon, COORDINATE_PRECISION)
        ))
    }

    /// Prefer the city the caller searched for; fall back to the coordinates.
    ///
    /// A city key ignores `lat`/`lon` entirely, so a cached forecast for that
    /// city is returned even when the request carries different coordinates.
    pub fn for_forecast(search_query: Option<&str>, lat: f64, lon: f64) -> Self {
        search_query
            .and_then(|raw| LookupKey::city(raw).ok())
            .unwrap_or_else(|| LookupKey::coordinates(lat, lon))
    }

    pub fn as_str(&self) -> &str {
        match self {
            LookupKey::City(key) | LookupKey::Coordinates(key) => key,
        }
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::City(city) => write!(f, "city:{}", city),
            LookupKey::Coordinates(pair) => write!(f, "coord:{}", pair),
        }
    }
}

pub fn normalize_city(raw: &str) -> Result<String> {
    let city = raw.trim().to_lowercase();
    if city.is_empty() {
        return Err(AppError::InvalidQuery("city must not be empty".to_string()));
    }
    Ok(city)
}

pub fn parse_coordinate(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidQuery(format!("not a number: {:?}", raw)))?;
    if !value.is_finite() {
        return Err(AppError::InvalidQuery(format!("not a finite number: {:?}", raw)));
    }
    Ok(value)
}

/// Parses a latitude/longitude pair and checks it lies on the globe.
pub fn parse_coordinates(raw_lat: &str, raw_lon: &str) -> Result<(f64, f64)> {
    let lat = parse_coordinate(raw_lat)?;
    let lon = parse_coordinate(raw_lon)?;
    validate_coordinates(lat, lon)?;
    Ok((lat, lon))
}

pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::InvalidQuery(format!(
            "Invalid latitude: {}. Must be between -90 and 90",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::InvalidQuery(format!(
            "Invalid longitude: {}. Must be between -180 and 180",
            lon
        )));
    }
    Ok(())
}

/// 1-based page number; absent means the first page.
pub fn parse_page(raw: Option<&str>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(1);
    };
    match raw.trim().parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(AppError::InvalidQuery(format!(
            "page must be a positive integer, got {:?}",
            raw
        ))),
    }
}

/// Unwraps a query parameter the route cannot do without.
pub fn require<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value.ok_or_else(|| AppError::InvalidQuery(format!("missing query parameter `{}`", name)))
}

pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let multiplier = 10_f64.powi(decimals as i32);
    (value * multiplier).round() / multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_city_ignores_case_and_whitespace() {
        let variants = ["Seattle", "seattle", "  SEATTLE ", "\tSeAtTlE\n"];
        for raw in variants {
            assert_eq!(normalize_city(raw).unwrap(), "seattle");
        }
        // idempotent
        let once = normalize_city(" New York ").unwrap();
        assert_eq!(normalize_city(&once).unwrap(), once);
    }

    #[test]
    fn test_normalize_city_rejects_blank() {
        assert!(matches!(normalize_city(""), Err(AppError::InvalidQuery(_))));
        assert!(matches!(normalize_city("   "), Err(AppError::InvalidQuery(_))));
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("47.6").unwrap(), 47.6);
        assert_eq!(parse_coordinate(" -122.3 ").unwrap(), -122.3);
        assert!(parse_coordinate("north").is_err());
        assert!(parse_coordinate("NaN").is_err());
        assert!(parse_coordinate("inf").is_err());
        assert!(parse_coordinate("").is_err());
    }

    #[test]
    fn test_parse_coordinates_range() {
        assert!(parse_coordinates("90", "180").is_ok());
        assert!(parse_coordinates("-90", "-180").is_ok());
        assert!(parse_coordinates("91", "0").is_err());
        assert!(parse_coordinates("0", "181").is_err());
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None).unwrap(), 1);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert!(matches!(parse_page(Some("0")), Err(AppError::InvalidQuery(_))));
        assert!(parse_page(Some("-2")).is_err());
        assert!(parse_page(Some("two")).is_err());
    }

    #[test]
    fn test_coordinate_key_rounding() {
        let a = LookupKey::coordinates(47.606_21, -122.332_08);
        let b = LookupKey::coordinates(47.606_19, -122.332_11);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "47.6062,-122.3321");
    }

    #[test]
    fn test_forecast_key_prefers_city() {
        let key = LookupKey::for_forecast(Some(" Seattle "), 47.6, -122.3);
        assert_eq!(key, LookupKey::City("seattle".to_string()));
        assert_eq!(key, LookupKey::city("SEATTLE").unwrap());

        let key = LookupKey::for_forecast(Some("  "), 47.6, -122.3);
        assert_eq!(key, LookupKey::coordinates(47.6, -122.3));
        assert_eq!(LookupKey::for_forecast(None, 1.0, 2.0).to_string(), "coord:1.0000,2.0000");
    }

    #[test]
    fn test_forecast_city_key_ignores_coordinates() {
        let oregon = LookupKey::for_forecast(Some("Portland"), 45.5, -122.6);
        let maine = LookupKey::for_forecast(Some("portland"), 43.6, -70.2);
        assert_eq!(oregon, maine);
        assert_ne!(
            LookupKey::for_forecast(None, 45.5, -122.6),
            LookupKey::for_forecast(None, 43.6, -70.2)
        );
    }
}
