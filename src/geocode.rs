//! Location resolution
//!
//! Turns the free-text place names found on itinerary items into coordinates.
//! Every parsed answer is memoized, negative ones included, so misspelled or
//! unknown places are only looked up once per process.

use crate::cache::Cache;
use crate::models::GeocodeResult;
use crate::provider::GeocodeProvider;
use crate::single_flight::SingleFlight;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Reason attached to results synthesized from transport or parse failures
pub const NETWORK_ERROR_REASON: &str = "Network error";

/// Cache key for a location: case-folded, otherwise verbatim
#[must_use]
pub fn cache_key(location: &str) -> String {
    location.to_lowercase()
}

/// Memoizing geocoder
pub struct GeocodeResolver {
    provider: Arc<dyn GeocodeProvider>,
    cache: Arc<dyn Cache<GeocodeResult>>,
    in_flight: SingleFlight<GeocodeResult>,
}

impl GeocodeResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn GeocodeProvider>, cache: Arc<dyn Cache<GeocodeResult>>) -> Self {
        Self {
            provider,
            cache,
            in_flight: SingleFlight::new(),
        }
    }

    /// Resolve a location name; never fails
    ///
    /// Transport and parse failures come back as
    /// `found: false, reason: "Network error"` and are not cached, so the
    /// next lookup tries again.
    #[instrument(skip(self))]
    pub async fn resolve(&self, location: &str) -> GeocodeResult {
        let key = cache_key(location);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Geocode cache hit for '{}'", key);
            return cached;
        }
        debug!("Geocode cache miss for '{}'", key);

        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let query = location.to_string();
        let cache_entry = key.clone();

        self.in_flight
            .run(&key, move || async move {
                // a racing resolution may have landed since the first check
                if let Some(cached) = cache.peek(&cache_entry) {
                    return cached;
                }
                match provider.geocode(&query).await {
                    Ok(result) => {
                        if !result.found {
                            debug!("Location '{}' did not resolve: {:?}", query, result.reason);
                        }
                        cache.put(cache_entry, result.clone());
                        result
                    }
                    Err(e) => {
                        warn!("Geocoding '{}' failed: {}", query, e);
                        GeocodeResult::not_found(NETWORK_ERROR_REASON)
                    }
                }
            })
            .await
            .unwrap_or_else(|| GeocodeResult::not_found(NETWORK_ERROR_REASON))
    }

    /// The cache backing this resolver
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache<GeocodeResult>> {
        &self.cache
    }
}
