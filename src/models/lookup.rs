//! Lookup requests and the state objects handed back to callers

use super::WeatherData;
use serde::{Deserialize, Serialize};

/// One keyed (location, date) request in a batch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    /// Caller-assigned id, stable across re-issues of the same logical request
    pub id: String,
    pub location: String,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
}

impl LookupRequest {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        location: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            date: date.into(),
        }
    }
}

/// State of a single lookup call site
///
/// `weather` being `None` is ambiguous on its own; read it together with
/// `loading` and `error`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LookupState {
    pub weather: Option<WeatherData>,
    pub loading: bool,
    pub error: Option<String>,
}

impl LookupState {
    /// Idle state: nothing requested, nothing loading
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn loading() -> Self {
        Self {
            weather: None,
            loading: true,
            error: None,
        }
    }

    #[must_use]
    pub fn resolved(weather: Option<WeatherData>) -> Self {
        Self {
            weather,
            loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self {
            weather: None,
            loading: false,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.weather.is_none() && !self.loading && self.error.is_none()
    }
}

/// Result slot for one id in a batch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchResult {
    pub id: String,
    pub weather: Option<WeatherData>,
    pub loading: bool,
}

impl BatchResult {
    #[must_use]
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weather: None,
            loading: true,
        }
    }

    #[must_use]
    pub fn settled(id: impl Into<String>, weather: Option<WeatherData>) -> Self {
        Self {
            id: id.into(),
            weather,
            loading: false,
        }
    }
}
