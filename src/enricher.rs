//! Weather enrichment service
//!
//! Wires provider, caches and resolvers together and hands out lookup call
//! sites. Every call site created from the same enricher shares its
//! resolvers, and through them the caches.

use crate::WeatherError;
use crate::batch::BatchLookup;
use crate::cache::{self, BoundedCache, Cache};
use crate::clock::{Clock, SystemClock};
use crate::config::{WeatherConfig, WindowConfig};
use crate::forecast::ForecastResolver;
use crate::geocode::GeocodeResolver;
use crate::lookup::WeatherLookup;
use crate::models::{GeocodeResult, WeatherData};
use crate::provider::{ForecastProvider, GeocodeProvider, HttpProvider};
use chrono::NaiveDate;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Shared entry point for single and batch lookups
#[derive(Clone)]
pub struct WeatherEnricher {
    inner: Arc<EnricherInner>,
}

struct EnricherInner {
    geocoder: GeocodeResolver,
    forecaster: ForecastResolver,
    clock: Arc<dyn Clock>,
    windows: WindowConfig,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
}

/// Builder for [`WeatherEnricher`]
pub struct EnricherBuilder {
    geocode_provider: Arc<dyn GeocodeProvider>,
    forecast_provider: Arc<dyn ForecastProvider>,
    geocode_cache: Option<Arc<dyn Cache<GeocodeResult>>>,
    forecast_cache: Option<Arc<dyn Cache<WeatherData>>>,
    clock: Arc<dyn Clock>,
    windows: WindowConfig,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
}

impl EnricherBuilder {
    #[must_use]
    pub fn with_geocode_cache(mut self, cache: Arc<dyn Cache<GeocodeResult>>) -> Self {
        self.geocode_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_forecast_cache(mut self, cache: Arc<dyn Cache<WeatherData>>) -> Self {
        self.forecast_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_windows(mut self, windows: WindowConfig) -> Self {
        self.windows = windows;
        self
    }

    /// Bound each geocode → forecast sequence
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runtime for lookups started outside of any tokio context
    ///
    /// Defaults to the runtime `build` is called from, if any.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the enricher; caches not set explicitly are the process-wide ones
    #[must_use]
    pub fn build(self) -> WeatherEnricher {
        let geocode_cache = self
            .geocode_cache
            .unwrap_or_else(cache::global_geocode_cache);
        let forecast_cache = self
            .forecast_cache
            .unwrap_or_else(cache::global_forecast_cache);

        WeatherEnricher {
            inner: Arc::new(EnricherInner {
                geocoder: GeocodeResolver::new(self.geocode_provider, geocode_cache),
                forecaster: ForecastResolver::new(self.forecast_provider, forecast_cache),
                clock: self.clock,
                windows: self.windows,
                timeout: self.timeout,
                runtime: self.runtime.or_else(|| Handle::try_current().ok()),
            }),
        }
    }
}

impl WeatherEnricher {
    /// Start building an enricher over the given providers
    #[must_use]
    pub fn builder(
        geocode_provider: Arc<dyn GeocodeProvider>,
        forecast_provider: Arc<dyn ForecastProvider>,
    ) -> EnricherBuilder {
        EnricherBuilder {
            geocode_provider,
            forecast_provider,
            geocode_cache: None,
            forecast_cache: None,
            clock: Arc::new(SystemClock),
            windows: WindowConfig::default(),
            timeout: None,
            runtime: None,
        }
    }

    /// Create an enricher talking HTTP to the configured provider
    pub fn from_config(config: &WeatherConfig) -> crate::Result<Self> {
        let provider = Arc::new(HttpProvider::new(&config.provider)?);
        info!("Weather provider at {}", provider.base_url());

        let mut builder = Self::builder(provider.clone(), provider)
            .with_windows(config.windows.clone())
            .with_timeout(config.lookup.timeout());

        if config.cache.geocode_capacity > 0 {
            builder = builder.with_geocode_cache(Arc::new(BoundedCache::new(
                config.cache.geocode_capacity,
            )));
        }
        if config.cache.forecast_capacity > 0 {
            builder = builder.with_forecast_cache(Arc::new(BoundedCache::new(
                config.cache.forecast_capacity,
            )));
        }

        Ok(builder.build())
    }

    /// New single-lookup call site
    #[must_use]
    pub fn lookup(&self) -> WeatherLookup {
        WeatherLookup::new(self.clone())
    }

    /// New batch call site
    #[must_use]
    pub fn batch(&self) -> BatchLookup {
        BatchLookup::new(self.clone())
    }

    /// Today's local calendar date per the configured clock
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.inner.clock.today()
    }

    /// Whether a lookup should be dispatched for `date`
    #[must_use]
    pub fn is_fetch_eligible(&self, date: &str) -> bool {
        self.inner.windows.fetch.contains(date, self.today())
    }

    /// Whether weather for `date` should be shown at all
    #[must_use]
    pub fn is_display_eligible(&self, date: &str) -> bool {
        self.inner.windows.display.contains(date, self.today())
    }

    #[must_use]
    pub fn geocoder(&self) -> &GeocodeResolver {
        &self.inner.geocoder
    }

    #[must_use]
    pub fn forecaster(&self) -> &ForecastResolver {
        &self.inner.forecaster
    }

    /// Spawn a lookup task on the caller's runtime, else the captured one
    ///
    /// Returns `false` when no runtime is reachable; the task is dropped.
    pub(crate) fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Handle::try_current().ok().or_else(|| self.inner.runtime.clone()) {
            Some(runtime) => {
                runtime.spawn(task);
                true
            }
            None => {
                error!("No tokio runtime available, weather lookup not started");
                false
            }
        }
    }

    /// Run geocode → forecast for one pair, ignoring the window policy
    ///
    /// `Ok(None)` covers an unresolved location and a failed forecast alike.
    /// Only the optional sequence timeout produces an error.
    pub async fn lookup_weather(
        &self,
        location: &str,
        date: &str,
    ) -> crate::Result<Option<WeatherData>> {
        let sequence = self.resolve_sequence(location, date);
        match self.inner.timeout {
            Some(limit) => tokio::time::timeout(limit, sequence).await.map_err(|_| {
                warn!(
                    "Weather lookup for '{}' on {} timed out after {:?}",
                    location, date, limit
                );
                WeatherError::lookup("Weather lookup timed out")
            }),
            None => Ok(sequence.await),
        }
    }

    async fn resolve_sequence(&self, location: &str, date: &str) -> Option<WeatherData> {
        let geocode = self.inner.geocoder.resolve(location).await;
        let Some(coordinates) = geocode.coordinates() else {
            debug!(
                "No coordinates for '{}' ({:?}), skipping forecast",
                location, geocode.reason
            );
            return None;
        };
        self.inner.forecaster.resolve(coordinates, date).await
    }
}
