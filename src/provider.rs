//! Geocoding and forecast provider clients
//!
//! The providers are external services reached over HTTP:
//! `GET {base}/geocode?q=<location>` and
//! `GET {base}/weather?lat=<lat>&lon=<lon>&date=<YYYY-MM-DD>`.
//! Both answer with JSON bodies that map directly onto the crate's models.

use crate::config::ProviderConfig;
use crate::models::{Coordinates, GeocodeResult, WeatherData};
use crate::{Result, WeatherError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Resolves free-text locations to coordinates
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, location: &str) -> Result<GeocodeResult>;
}

/// Fetches the daily weather summary for a point and date
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(&self, coordinates: Coordinates, date: &str) -> Result<WeatherData>;
}

/// HTTP client for the geocode and weather endpoints
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: Client,
    base_url: String,
}

impl HttpProvider {
    /// Create a client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| WeatherError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &str) -> Result<T> {
        debug!("Provider request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::status(status.as_u16(), endpoint));
        }

        let body = response.json::<T>().await?;

        let elapsed = start_time.elapsed();
        if elapsed > SLOW_RESPONSE {
            warn!(
                "Slow {} response detected: {:.3}s",
                endpoint,
                elapsed.as_secs_f64()
            );
        } else {
            debug!("{} responded in {:.3}s", endpoint, elapsed.as_secs_f64());
        }

        Ok(body)
    }
}

#[async_trait]
impl GeocodeProvider for HttpProvider {
    #[instrument(skip(self))]
    async fn geocode(&self, location: &str) -> Result<GeocodeResult> {
        info!("Geocoding location: '{}'", location);
        let url = format!(
            "{}/geocode?q={}",
            self.base_url,
            urlencoding::encode(location)
        );
        self.get_json("/geocode", &url).await
    }
}

#[async_trait]
impl ForecastProvider for HttpProvider {
    #[instrument(skip(self))]
    async fn forecast(&self, coordinates: Coordinates, date: &str) -> Result<WeatherData> {
        info!(
            "Getting forecast for {:.4}, {:.4} on {}",
            coordinates.latitude, coordinates.longitude, date
        );
        let url = format!(
            "{}/weather?lat={}&lon={}&date={}",
            self.base_url,
            coordinates.latitude,
            coordinates.longitude,
            urlencoding::encode(date)
        );
        self.get_json("/weather", &url).await
    }
}
