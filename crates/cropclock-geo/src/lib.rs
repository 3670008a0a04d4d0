//! Location and weather lookups for CropClock
//!
//! Geocoding via Nominatim, current conditions via Open-Meteo, and
//! device position providers.

pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use geocode::{GeoClient, Geocoder};
pub use location::{ConfiguredLocator, DeviceLocator, FixedLocator, UnavailableLocator};
pub use provider::{ConditionsSource, WeatherClient};
pub use types::*;
