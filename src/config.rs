//! Configuration for the weather enrichment layer
//!
//! Handles loading configuration from files and environment variables,
//! and validates provider, cache, window and logging settings.

use crate::WeatherError;
use crate::window::ForecastWindow;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    /// Geocoding/forecast provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Cache bounds
    #[serde(default)]
    pub cache: CacheConfig,
    /// Fetch and display windows
    #[serde(default)]
    pub windows: WindowConfig,
    /// Orchestrator settings
    #[serde(default)]
    pub lookup: LookupConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Provider HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL serving `/geocode` and `/weather`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u32,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Cache bounds; `0` keeps the process-wide unbounded cache
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub geocode_capacity: usize,
    #[serde(default)]
    pub forecast_capacity: usize,
}

/// Day-offset windows relative to today
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Dates a lookup is dispatched for
    #[serde(default = "default_fetch_window")]
    pub fetch: ForecastWindow,
    /// Dates a caller should show weather for
    #[serde(default = "default_display_window")]
    pub display: ForecastWindow,
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LookupConfig {
    /// Whole-sequence timeout in seconds, `0` disables it
    #[serde(default)]
    pub timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_provider_timeout() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("trip-weather/{}", crate::VERSION)
}

fn default_fetch_window() -> ForecastWindow {
    crate::window::FETCH_WINDOW
}

fn default_display_window() -> ForecastWindow {
    crate::window::DISPLAY_WINDOW
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_provider_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            fetch: default_fetch_window(),
            display: default_display_window(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl LookupConfig {
    /// Sequence timeout, if enabled
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds.into()))
    }
}

impl WeatherConfig {
    /// Load configuration from the default file location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.or_else(Self::get_config_path);

        if let Some(config_file) = config_file.filter(|path| path.exists()) {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TRIPWX_PROVIDER__BASE_URL
        builder = builder.add_source(
            Environment::with_prefix("TRIPWX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trip-weather").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.provider.base_url.is_empty() {
            self.provider.base_url = default_base_url();
        }
        if self.provider.timeout_seconds == 0 {
            self.provider.timeout_seconds = default_provider_timeout();
        }
        if self.provider.user_agent.is_empty() {
            self.provider.user_agent = default_user_agent();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_windows()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.provider.timeout_seconds > 300 {
            return Err(
                WeatherError::config("Provider timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.lookup.timeout_seconds > 300 {
            return Err(WeatherError::config("Lookup timeout cannot exceed 300 seconds").into());
        }

        Ok(())
    }

    fn validate_windows(&self) -> Result<()> {
        let fetch = self.windows.fetch;
        let display = self.windows.display;

        if fetch.min_offset_days > fetch.max_offset_days {
            return Err(WeatherError::config(format!(
                "Fetch window is empty: {} > {}",
                fetch.min_offset_days, fetch.max_offset_days
            ))
            .into());
        }

        if display.min_offset_days > display.max_offset_days {
            return Err(WeatherError::config(format!(
                "Display window is empty: {} > {}",
                display.min_offset_days, display.max_offset_days
            ))
            .into());
        }

        if display.min_offset_days < fetch.min_offset_days
            || display.max_offset_days > fetch.max_offset_days
        {
            return Err(
                WeatherError::config("Display window must lie inside the fetch window").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(
                WeatherError::config("Provider base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }
}
