//! `trip-weather` - Location-weather enrichment for trip itineraries
//!
//! Resolves free-text place names to coordinates, looks up the daily forecast
//! for those coordinates, and memoizes both. Two call-site orchestrators sit
//! on top: [`WeatherLookup`] follows one `(location, date)` pair and discards
//! superseded results, [`BatchLookup`] keeps one result slot per request id.

pub mod batch;
pub mod cache;
pub mod clock;
pub mod config;
pub mod enricher;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod itinerary;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod provider;
pub mod single_flight;
pub mod window;

#[cfg(test)]
mod testing;

// Re-export core types for public API
pub use batch::BatchLookup;
pub use cache::{BoundedCache, Cache, CacheStats, MemoryCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::WeatherConfig;
pub use enricher::{EnricherBuilder, WeatherEnricher};
pub use error::WeatherError;
pub use forecast::ForecastResolver;
pub use geocode::GeocodeResolver;
pub use itinerary::{ItineraryItem, Located, first_location};
pub use logging::init_tracing;
pub use lookup::WeatherLookup;
pub use models::{
    BatchResult, Coordinates, GeocodeResult, LookupRequest, LookupState, WeatherCondition,
    WeatherData,
};
pub use provider::{ForecastProvider, GeocodeProvider, HttpProvider};
pub use window::{DISPLAY_WINDOW, FETCH_WINDOW, ForecastWindow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherError>;
