//! Daily weather summary model and display methods

use serde::{Deserialize, Serialize};

/// Daily weather summary as returned by the forecast provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// Whether the provider had data for this date
    pub available: bool,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// WMO weather interpretation code
    #[serde(default)]
    pub weather_code: i32,
    /// Human-readable description of weather conditions
    #[serde(default)]
    pub description: String,
    /// Icon identifier chosen by the provider
    #[serde(default)]
    pub icon: String,
    /// Daily maximum temperature in Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_max: Option<f64>,
    /// Daily minimum temperature in Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_min: Option<f64>,
}

/// Coarse weather categories derived from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// Map a WMO weather code to a condition
    /// See: https://open-meteo.com/en/docs#weathervariables
    #[must_use]
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 | 56 | 57 => Self::Drizzle,
            61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => Self::Rain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear sky",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

impl WeatherData {
    /// Placeholder returned by the provider when it has no data for a date
    #[must_use]
    pub fn unavailable(date: impl Into<String>) -> Self {
        Self {
            available: false,
            date: date.into(),
            weather_code: 0,
            description: String::new(),
            icon: String::new(),
            temperature_max: None,
            temperature_min: None,
        }
    }

    /// Coarse condition for this day
    #[must_use]
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }

    /// Format the temperature range with unit, e.g. "18°C / 9°C"
    #[must_use]
    pub fn format_temperature_range(&self) -> Option<String> {
        match (self.temperature_max, self.temperature_min) {
            (Some(max), Some(min)) => Some(format!("{max:.0}°C / {min:.0}°C")),
            (Some(max), None) => Some(format!("{max:.0}°C")),
            (None, Some(min)) => Some(format!("{min:.0}°C")),
            (None, None) => None,
        }
    }
}
