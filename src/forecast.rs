//! Daily forecast resolution
//!
//! Looks up the weather summary for a point on a calendar date. Only
//! available summaries are memoized: a date just past the provider's horizon
//! today can come into range tomorrow.

use crate::cache::Cache;
use crate::models::{Coordinates, WeatherData};
use crate::provider::ForecastProvider;
use crate::single_flight::SingleFlight;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Memoizing forecast lookup
pub struct ForecastResolver {
    provider: Arc<dyn ForecastProvider>,
    cache: Arc<dyn Cache<WeatherData>>,
    in_flight: SingleFlight<Option<WeatherData>>,
}

impl ForecastResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn ForecastProvider>, cache: Arc<dyn Cache<WeatherData>>) -> Self {
        Self {
            provider,
            cache,
            in_flight: SingleFlight::new(),
        }
    }

    /// Resolve the summary for `coordinates` on `date`
    ///
    /// Returns `None` when the provider could not be reached or its answer
    /// could not be parsed. An unavailable summary is returned as-is but not
    /// cached.
    #[instrument(skip(self))]
    pub async fn resolve(&self, coordinates: Coordinates, date: &str) -> Option<WeatherData> {
        let key = coordinates.cache_key(date);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Forecast cache hit for {}", key);
            return Some(cached);
        }
        debug!("Forecast cache miss for {}", key);

        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let date = date.to_string();
        let cache_entry = key.clone();

        self.in_flight
            .run(&key, move || async move {
                if let Some(cached) = cache.peek(&cache_entry) {
                    return Some(cached);
                }
                match provider.forecast(coordinates, &date).await {
                    Ok(weather) if weather.available => {
                        cache.put(cache_entry, weather.clone());
                        Some(weather)
                    }
                    Ok(weather) => {
                        debug!("No forecast available yet for {}", cache_entry);
                        Some(weather)
                    }
                    Err(e) => {
                        warn!("Forecast lookup for {} failed: {}", cache_entry, e);
                        None
                    }
                }
            })
            .await
            .flatten()
    }

    /// The cache backing this resolver
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache<WeatherData>> {
        &self.cache
    }
}
