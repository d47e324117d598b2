//! Error types for the weather enrichment layer
//!
//! None of these ever reach lookup callers: resolvers turn them into negative
//! results and orchestrators into settled states.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum WeatherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport failures talking to a provider
    #[error("Network error: {message}")]
    Network { message: String },

    /// Provider answered with a non-success status
    #[error("Provider returned status {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Provider body could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Failures in the lookup sequence itself
    #[error("Lookup error: {message}")]
    Lookup { message: String },
}

impl WeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new status error
    pub fn status<S: Into<String>>(status: u16, endpoint: S) -> Self {
        Self::Status {
            status,
            endpoint: endpoint.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new lookup error
    pub fn lookup<S: Into<String>>(message: S) -> Self {
        Self::Lookup {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::Config { .. } => {
                "Weather configuration error. Please check the provider settings.".to_string()
            }
            WeatherError::Network { .. } | WeatherError::Status { .. } => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            WeatherError::Parse { .. } => {
                "The weather service sent an unexpected response.".to_string()
            }
            WeatherError::Lookup { .. } => "Failed to load weather".to_string(),
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}
