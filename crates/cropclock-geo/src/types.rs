use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label used when reverse geocoding cannot name a place.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One entry of a forward-geocoding result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub id: String,
    pub display_name: String,
    pub coordinate: Coordinate,
}

impl PlaceCandidate {
    /// Text before the first separator of the full display name,
    /// e.g. "Madurai" for "Madurai, Madurai District, Tamil Nadu, India".
    pub fn primary_label(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or_default()
    }
}

/// Administrative hierarchy returned by reverse geocoding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressHierarchy {
    pub village: Option<String>,
    pub town: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl AddressHierarchy {
    /// Most specific locality: village, then town, city, county.
    pub fn locality(&self) -> Option<&str> {
        [&self.village, &self.town, &self.city, &self.county]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// Result of a successful reverse geocode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocode {
    pub label: String,
    pub address: AddressHierarchy,
}

/// Current weather at a coordinate, without any location naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    /// Absent when the provider has no precipitation reading
    pub precipitation_mm: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

/// Resolved location plus weather, as shown by a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub location_label: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub precipitation_mm: Option<f64>,
    pub resolved_at: DateTime<Utc>,
}

impl EnvironmentSnapshot {
    pub fn new(location_label: impl Into<String>, conditions: CurrentConditions) -> Self {
        Self {
            location_label: location_label.into(),
            temperature_c: conditions.temperature_c,
            humidity_pct: conditions.humidity_pct,
            precipitation_mm: conditions.precipitation_mm,
            resolved_at: Utc::now(),
        }
    }
}

/// Device location errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("No place name for {0}")]
    Lookup(Coordinate),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather data unavailable: {0}")]
    DataUnavailable(String),
}
