//! Maps session errors to cropclock_core::AppError for consistent user-facing messages.

use cropclock_core::{
    AppError, NetworkError, PredictionError, ReqwestErrorExt, WeatherError as CoreWeatherError,
};
use cropclock_geo::{GeoError, WeatherError};
use cropclock_services::ClientError;

use crate::error::{OrchestratorError, ResolveError};

pub(crate) fn resolve_to_app_error(e: &ResolveError) -> AppError {
    match e {
        ResolveError::LocationNotFound(q) => {
            AppError::Weather(CoreWeatherError::LocationNotFound(q.clone()))
        }
        ResolveError::Precondition(msg) => {
            AppError::Weather(CoreWeatherError::MissingInput(msg.to_string()))
        }
        ResolveError::Geo(GeoError::Network(e)) => AppError::Network(e.to_network_error()),
        ResolveError::Geo(GeoError::Lookup(at)) => {
            AppError::Weather(CoreWeatherError::LocationNotFound(at.to_string()))
        }
        ResolveError::Weather(WeatherError::Network(e)) => AppError::Network(e.to_network_error()),
        ResolveError::Weather(WeatherError::DataUnavailable(s)) => {
            AppError::Weather(CoreWeatherError::DataUnavailable(s.clone()))
        }
    }
}

pub(crate) fn orchestrator_to_app_error(e: &OrchestratorError) -> AppError {
    match e {
        OrchestratorError::Precondition(msg) => {
            AppError::Prediction(PredictionError::Precondition(msg.clone()))
        }
        OrchestratorError::Client(ClientError::Backend(msg)) => {
            AppError::Prediction(PredictionError::Backend(msg.clone()))
        }
        OrchestratorError::Client(ClientError::Network(e)) => AppError::Network(e.to_network_error()),
        OrchestratorError::Client(ClientError::Status { status, body }) => {
            AppError::Network(NetworkError::ServerError {
                status: *status,
                message: body.clone(),
            })
        }
        OrchestratorError::Client(ClientError::InvalidResponse(s)) => {
            AppError::Network(NetworkError::InvalidResponse(s.clone()))
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        resolve_to_app_error(&e)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        orchestrator_to_app_error(&e)
    }
}
