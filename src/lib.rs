//! City explorer back-end: geocoding, daily forecasts and nearby restaurants
//! aggregated from three upstream providers behind in-process caches.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod pagination;
pub mod query;
pub mod routes;
pub mod upstream;
