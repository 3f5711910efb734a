//! Wire shapes of the three upstream providers. Only the fields the
//! transforms read are declared; everything else is ignored.

use serde::Deserialize;

use crate::error::{AppError, Result};

/// A decimal the geocoder may send either as a string or as a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    pub fn to_f64(&self, field: &str) -> Result<f64> {
        let value = match self {
            Decimal::Number(value) => *value,
            Decimal::Text(raw) => raw.trim().parse::<f64>().map_err(|_| {
                AppError::Parse(format!("{} is not a decimal: {:?}", field, raw))
            })?,
        };
        if !value.is_finite() {
            return Err(AppError::Parse(format!("{} is not finite: {}", field, value)));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeHit {
    pub display_name: String,
    pub lat: Decimal,
    pub lon: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyForecastResponse {
    pub data: Vec<DailyForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyForecastItem {
    pub weather: DailyForecastWeather,
    pub datetime: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyForecastWeather {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessSearchResponse {
    pub businesses: Vec<Business>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Business {
    pub name: String,
    pub url: String,
    pub rating: Option<f64>,
    pub price: Option<String>,
    pub image_url: Option<String>,
}
