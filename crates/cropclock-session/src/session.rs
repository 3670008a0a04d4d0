//! Wiring for one application session.
//!
//! A [`Session`] owns the HTTP clients and the shared N/P/K store and hands
//! out per-view components. Each view gets its own [`LocationResolver`] and
//! [`PredictionOrchestrator`]; all of them share the same agronomic state.

use cropclock_core::{AppError, Config, ConfigError};
use cropclock_geo::{ConfiguredLocator, Coordinate, GeoClient, WeatherClient};
use cropclock_services::PredictionClient;

use crate::agronomic::SharedAgronomicState;
use crate::orchestrator::PredictionOrchestrator;
use crate::resolver::{LocationResolver, ResolverSettings};

/// Resolver type used by views in a live session.
pub type SessionResolver = LocationResolver<GeoClient, WeatherClient, ConfiguredLocator>;

#[derive(Debug, Clone)]
pub struct Session {
    geocoder: GeoClient,
    weather: WeatherClient,
    locator: ConfiguredLocator,
    prediction: PredictionClient,
    state: SharedAgronomicState,
    settings: ResolverSettings,
}

impl Session {
    /// Validate `config` and build every client it describes.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let validation = config.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        let endpoints = &config.endpoints;
        let timeout = endpoints.request_timeout();

        let geocoder =
            GeoClient::with_base_url(&endpoints.geocoding_url, &endpoints.user_agent, timeout)
                .map_err(|e| ConfigError::Client(e.to_string()))?;
        let weather = WeatherClient::with_base_url(&endpoints.weather_url, timeout)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        let prediction = PredictionClient::new(&endpoints.prediction_url, timeout)
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        let home = config
            .location
            .home
            .map(|h| Coordinate::new(h.latitude, h.longitude));

        tracing::info!(
            "Session ready (geocoder: {}, weather: {}, backend: {})",
            endpoints.geocoding_url,
            endpoints.weather_url,
            endpoints.prediction_url
        );

        Ok(Self {
            geocoder,
            weather,
            locator: ConfiguredLocator::from_home(home),
            prediction,
            state: SharedAgronomicState::new(),
            settings: ResolverSettings::from_config(config),
        })
    }

    /// A fresh resolver for one view.
    pub fn location_resolver(&self) -> SessionResolver {
        LocationResolver::new(
            self.geocoder.clone(),
            self.weather.clone(),
            self.locator,
            self.settings,
        )
    }

    /// A fresh orchestrator for one view, sharing the session's N/P/K store.
    pub fn orchestrator(&self) -> PredictionOrchestrator {
        PredictionOrchestrator::new(self.prediction.clone(), self.state.clone())
    }

    pub fn agronomic_state(&self) -> &SharedAgronomicState {
        &self.state
    }
}
