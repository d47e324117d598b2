//! Geocoding result model and coordinate helpers

use serde::{Deserialize, Serialize};

/// Decimal places kept when deriving forecast cache keys (~11 m)
pub const KEY_PRECISION: u32 = 4;

/// Result of resolving a free-text location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    /// Whether the location resolved to coordinates
    pub found: bool,
    /// Latitude in decimal degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Provider's canonical name for the place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Why the lookup did not resolve
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GeocodeResult {
    /// Create a resolved result
    #[must_use]
    pub fn found(latitude: f64, longitude: f64, display_name: Option<String>) -> Self {
        Self {
            found: true,
            latitude: Some(latitude),
            longitude: Some(longitude),
            display_name,
            reason: None,
        }
    }

    /// Create a negative result with a reason
    #[must_use]
    pub fn not_found<S: Into<String>>(reason: S) -> Self {
        Self {
            found: false,
            latitude: None,
            longitude: None,
            display_name: None,
            reason: Some(reason.into()),
        }
    }

    /// Coordinates, if the location resolved and the provider sent both
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        if !self.found {
            return None;
        }
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }
}

/// Geographic coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        // `+ 0.0` folds -0.0 into 0.0 so both render the same key
        let lat = (self.latitude * multiplier).round() / multiplier + 0.0;
        let lon = (self.longitude * multiplier).round() / multiplier + 0.0;
        (lat, lon)
    }

    /// Forecast cache key for this point on the given date
    #[must_use]
    pub fn cache_key(&self, date: &str) -> String {
        let (lat, lon) = self.rounded(KEY_PRECISION);
        format!("{lat:.4},{lon:.4},{date}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_forecast_cache_key() {
        let coordinates = Coordinates::new(35.681_236, 139.767_125);
        assert_eq!(coordinates.cache_key("2024-05-01"), "35.6812,139.7671,2024-05-01");
    }

    #[rstest]
    #[case(35.68123, 139.76709)]
    #[case(35.681_249, 139.767_149)]
    #[case(35.681_16, 139.767_06)]
    fn test_nearby_coordinates_share_key(#[case] lat: f64, #[case] lon: f64) {
        let key = Coordinates::new(lat, lon).cache_key("2024-05-01");
        assert_eq!(key, "35.6812,139.7671,2024-05-01");
    }

    #[test]
    fn test_key_keeps_trailing_zeros() {
        let coordinates = Coordinates::new(48.8, 2.35);
        assert_eq!(coordinates.cache_key("2024-05-01"), "48.8000,2.3500,2024-05-01");
    }

    #[test]
    fn test_negative_zero_folds_to_zero() {
        let coordinates = Coordinates::new(-0.000_01, 0.000_01);
        assert_eq!(coordinates.cache_key("2024-05-01"), "0.0000,0.0000,2024-05-01");
    }

    #[test]
    fn test_coordinates_require_found_and_both_axes() {
        let resolved = GeocodeResult::found(35.0, 135.7, Some("Kyoto".to_string()));
        assert_eq!(resolved.coordinates(), Some(Coordinates::new(35.0, 135.7)));

        let mut partial = resolved.clone();
        partial.longitude = None;
        assert_eq!(partial.coordinates(), None);

        let missing = GeocodeResult::not_found("Location not found");
        assert_eq!(missing.coordinates(), None);
    }

    #[test]
    fn test_deserialize_provider_payload() {
        let json = r#"{"found": true, "latitude": 35.0116, "longitude": 135.7681, "displayName": "Kyoto, Japan"}"#;
        let result: GeocodeResult = serde_json::from_str(json).unwrap();
        assert!(result.found);
        assert_eq!(result.display_name.as_deref(), Some("Kyoto, Japan"));

        let json = r#"{"found": false, "reason": "No results"}"#;
        let result: GeocodeResult = serde_json::from_str(json).unwrap();
        assert_eq!(result, GeocodeResult::not_found("No results"));
    }
}
