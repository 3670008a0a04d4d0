//! Errors reported to views by the resolver and the orchestrator.
//!
//! Superseded results never become errors; they are dropped before they
//! get here.

use cropclock_geo::{GeoError, WeatherError};
use cropclock_services::ClientError;
use thiserror::Error;

use crate::error_mapping::{orchestrator_to_app_error, resolve_to_app_error};

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Search returned zero candidates for the typed address
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("{0}")]
    Precondition(&'static str),

    #[error("Geocoding failed: {0}")]
    Geo(#[from] GeoError),

    #[error("Weather lookup failed: {0}")]
    Weather(#[from] WeatherError),
}

impl ResolveError {
    pub fn display_message(&self) -> String {
        resolve_to_app_error(self).user_message()
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Checked before any request; names what is missing
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl OrchestratorError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Message shown in the view's result area.
    pub fn display_message(&self) -> String {
        orchestrator_to_app_error(self).user_message()
    }
}
