//! Device position providers.

use crate::types::{Coordinate, LocationError};

/// Source of the device's current position.
///
/// Implementations may wait on a permission prompt; callers bound the wait.
pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Host without a location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocator;

impl DeviceLocator for UnavailableLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// A configured position reported as the device position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    position: Coordinate,
}

impl FixedLocator {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

impl DeviceLocator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        tracing::debug!("Using configured position {}", self.position);
        Ok(self.position)
    }
}

/// Configured position when present, otherwise no location service.
#[derive(Debug, Clone, Copy)]
pub enum ConfiguredLocator {
    Fixed(FixedLocator),
    Unavailable(UnavailableLocator),
}

impl ConfiguredLocator {
    pub fn from_home(home: Option<Coordinate>) -> Self {
        match home {
            Some(position) => Self::Fixed(FixedLocator::new(position)),
            None => Self::Unavailable(UnavailableLocator),
        }
    }
}

impl DeviceLocator for ConfiguredLocator {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        match self {
            Self::Fixed(l) => l.current_position().await,
            Self::Unavailable(l) => l.current_position().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_locator() {
        let err = UnavailableLocator.current_position().await.unwrap_err();
        assert_eq!(err, LocationError::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_configured_locator_uses_home() {
        let home = Coordinate::new(10.79, 79.13);
        let locator = ConfiguredLocator::from_home(Some(home));
        assert_eq!(locator.current_position().await.unwrap(), home);
    }

    #[tokio::test]
    async fn test_configured_locator_without_home() {
        let locator = ConfiguredLocator::from_home(None);
        assert!(locator.current_position().await.is_err());
    }
}
