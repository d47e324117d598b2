//! Data models for the weather enrichment layer
//!
//! This module contains the core domain models organized by concern:
//! - Geocode: Location resolution results and coordinates
//! - Weather: Daily weather summaries from the forecast provider
//! - Lookup: Requests and state objects exchanged with callers

pub mod geocode;
pub mod lookup;
pub mod weather;

// Re-export all public types for convenient access
pub use geocode::{Coordinates, GeocodeResult};
pub use lookup::{BatchResult, LookupRequest, LookupState};
pub use weather::{WeatherCondition, WeatherData};
