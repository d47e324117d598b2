//! In-process fake providers for unit tests

use crate::cache::{MemoryCache, lock};
use crate::clock::FixedClock;
use crate::enricher::WeatherEnricher;
use crate::models::{Coordinates, GeocodeResult, WeatherData};
use crate::provider::{ForecastProvider, GeocodeProvider};
use crate::{Result, WeatherError};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn day(offset: i64) -> String {
    (today() + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}

/// Provider double with call counters and per-location gates
#[derive(Default)]
pub struct FakeProvider {
    places: Mutex<HashMap<String, (f64, f64)>>,
    unavailable_dates: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    fail_geocode: AtomicBool,
    fail_forecast: AtomicBool,
    geocode_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        let provider = Self::default();
        provider.add_place("Kyoto", 35.0116, 135.7681);
        provider.add_place("Osaka", 34.6937, 135.5023);
        provider.add_place("Tokyo Station", 35.68123, 139.76709);
        Arc::new(provider)
    }

    pub fn add_place(&self, name: &str, latitude: f64, longitude: f64) {
        lock(&self.places).insert(name.to_lowercase(), (latitude, longitude));
    }

    pub fn mark_unavailable(&self, date: &str) {
        lock(&self.unavailable_dates).insert(date.to_string());
    }

    pub fn mark_available(&self, date: &str) {
        lock(&self.unavailable_dates).remove(date);
    }

    pub fn fail_geocode(&self, fail: bool) {
        self.fail_geocode.store(fail, Ordering::SeqCst);
    }

    pub fn fail_forecast(&self, fail: bool) {
        self.fail_forecast.store(fail, Ordering::SeqCst);
    }

    /// Make geocode calls for `location` wait until [`FakeProvider::release`]
    pub fn hold(&self, location: &str) {
        lock(&self.gates).insert(location.to_lowercase(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held geocode call for `location` finish
    pub fn release(&self, location: &str) {
        if let Some(gate) = lock(&self.gates).get(&location.to_lowercase()) {
            gate.add_permits(1);
        }
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.geocode_calls() + self.forecast_calls()
    }

    /// Description the fake reports for a point
    pub fn description_for(latitude: f64, longitude: f64) -> String {
        format!("Clear sky over {latitude:.4},{longitude:.4}")
    }
}

#[async_trait]
impl GeocodeProvider for FakeProvider {
    async fn geocode(&self, location: &str) -> Result<GeocodeResult> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.gates).get(&location.to_lowercase()).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.fail_geocode.load(Ordering::SeqCst) {
            return Err(WeatherError::network("connection reset"));
        }

        let place = lock(&self.places).get(&location.to_lowercase()).copied();
        Ok(match place {
            Some((latitude, longitude)) => {
                GeocodeResult::found(latitude, longitude, Some(location.to_string()))
            }
            None => GeocodeResult::not_found("Location not found"),
        })
    }
}

#[async_trait]
impl ForecastProvider for FakeProvider {
    async fn forecast(&self, coordinates: Coordinates, date: &str) -> Result<WeatherData> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_forecast.load(Ordering::SeqCst) {
            return Err(WeatherError::network("connection reset"));
        }
        if lock(&self.unavailable_dates).contains(date) {
            return Ok(WeatherData::unavailable(date));
        }

        Ok(WeatherData {
            available: true,
            date: date.to_string(),
            weather_code: 0,
            description: Self::description_for(coordinates.latitude, coordinates.longitude),
            icon: "sun".to_string(),
            temperature_max: Some(22.0),
            temperature_min: Some(12.0),
        })
    }
}

/// Enricher over `provider` with fresh caches and today pinned to [`today`]
pub fn enricher(provider: &Arc<FakeProvider>) -> WeatherEnricher {
    WeatherEnricher::builder(provider.clone(), provider.clone())
        .with_geocode_cache(Arc::new(MemoryCache::new()))
        .with_forecast_cache(Arc::new(MemoryCache::new()))
        .with_clock(Arc::new(FixedClock(today())))
        .build()
}

/// Yield until `condition` holds, bounded so a broken test fails instead of hanging
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
