use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A geocoded city. `search_query` is the normalized city string it was
/// looked up under, and is unique in the durable tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Location {
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One day of forecast, in upstream (chronological) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Forecast {
    pub forecast: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Restaurant {
    pub name: String,
    pub url: String,
    pub rating: f64,
    pub price: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Overview {
    pub location: Location,
    pub forecasts: Vec<Forecast>,
    pub restaurants: Vec<Restaurant>,
}
