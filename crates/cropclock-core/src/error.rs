//! Centralized error types for CropClock.
//!
//! Crate-level errors (geocoding, weather, prediction backend) are mapped
//! into [`AppError`] at the session boundary so that every view renders
//! failures the same way.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    ///
    /// Precondition and backend messages pass through unchanged; everything
    /// else gets a fixed, non-technical sentence.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => e.user_message().to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message().to_string(),
            AppError::Prediction(e) => e.user_message(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::Client(_) => "Unable to start network services. Check your settings.",
        }
    }
}

/// Location and weather resolution errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Missing input: {0}")]
    MissingInput(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found. Check and try again.",
            WeatherError::DataUnavailable(_) => {
                "Weather data is unavailable right now. Please try again."
            }
            WeatherError::MissingInput(_) => "Please enter a location.",
        }
    }
}

/// Prediction workflow errors.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Client-side validation failed before any request was made.
    #[error("{0}")]
    Precondition(String),

    /// The backend answered with `{ "error": ... }`.
    #[error("{0}")]
    Backend(String),
}

impl PredictionError {
    pub fn user_message(&self) -> String {
        match self {
            PredictionError::Precondition(msg) | PredictionError::Backend(msg) => msg.clone(),
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn to_network_error(&self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn to_network_error(&self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let err = WeatherError::DataUnavailable("humidity missing".into());
        let app_err: AppError = err.into();
        assert!(matches!(
            app_err,
            AppError::Weather(WeatherError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_backend_message_is_verbatim() {
        let app_err = AppError::Prediction(PredictionError::Backend(
            "Unknown soil type: Peaty".into(),
        ));
        assert_eq!(app_err.user_message(), "Unknown soil type: Peaty");
    }

    #[test]
    fn test_server_error_messages_by_status() {
        let server = NetworkError::ServerError {
            status: 503,
            message: "unavailable".into(),
        };
        let client = NetworkError::ServerError {
            status: 400,
            message: "bad request".into(),
        };
        assert!(server.user_message().contains("later"));
        assert!(!client.user_message().contains("later"));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Weather(WeatherError::LocationNotFound("Madurai".into()));
        assert_eq!(app_err.user_message(), "Location not found. Check and try again.");
    }
}
