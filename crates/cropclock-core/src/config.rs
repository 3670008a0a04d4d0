use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Third-party and backend endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Search-as-you-type behaviour
    #[serde(default)]
    pub autocomplete: AutocompleteConfig,

    /// Device location settings
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Nominatim-compatible geocoding service (search + reverse)
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Open-Meteo-compatible weather service
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Prediction backend (nutrient estimate, crop, fertilizer, price)
    #[serde(default = "default_prediction_url")]
    pub prediction_url: String,

    /// User agent sent to the public geocoder, which rejects anonymous clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout for every HTTP call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_weather_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_prediction_url() -> String {
    "https://cropclock-backend.onrender.com".to_string()
}

fn default_user_agent() -> String {
    format!("CropClock/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            prediction_url: default_prediction_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EndpointsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteConfig {
    /// Quiet period after the last keystroke before a search is issued
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Queries shorter than this never reach the geocoder
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Maximum number of suggestions requested per search
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_min_query_chars() -> usize {
    3
}

fn default_suggestion_limit() -> usize {
    5
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

impl AutocompleteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// A fixed position used when the host has no location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Upper bound on the wait for a device position
    #[serde(default = "default_geolocation_timeout_secs")]
    pub geolocation_timeout_secs: u64,

    /// Used as the device position when set
    #[serde(default)]
    pub home: Option<HomeCoordinate>,
}

fn default_geolocation_timeout_secs() -> u64 {
    10
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geolocation_timeout_secs: default_geolocation_timeout_secs(),
            home: None,
        }
    }
}

impl LocationConfig {
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default file if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; any error fails the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.endpoints.geocoding_url,
            "endpoints.geocoding_url",
            &mut result,
        );
        self.validate_url(
            &self.endpoints.weather_url,
            "endpoints.weather_url",
            &mut result,
        );
        self.validate_url(
            &self.endpoints.prediction_url,
            "endpoints.prediction_url",
            &mut result,
        );

        if self.endpoints.user_agent.trim().is_empty() {
            result.add_error("endpoints.user_agent", "User agent must not be empty");
        }

        if self.endpoints.request_timeout_secs == 0 {
            result.add_error(
                "endpoints.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.endpoints.request_timeout_secs > 120 {
            result.add_warning(
                "endpoints.request_timeout_secs",
                "Request timeout is unusually long (>120s)",
            );
        }

        if self.autocomplete.debounce_ms == 0 {
            result.add_warning(
                "autocomplete.debounce_ms",
                "Debounce disabled - every keystroke issues a search",
            );
        } else if self.autocomplete.debounce_ms > 5000 {
            result.add_warning(
                "autocomplete.debounce_ms",
                "Debounce is more than 5 seconds",
            );
        }

        if self.autocomplete.min_query_chars == 0 {
            result.add_error(
                "autocomplete.min_query_chars",
                "Minimum query length must be greater than 0",
            );
        } else if self.autocomplete.min_query_chars < default_min_query_chars() {
            result.add_warning(
                "autocomplete.min_query_chars",
                "Very short queries will be sent to the geocoder",
            );
        }

        if self.autocomplete.suggestion_limit == 0 {
            result.add_error(
                "autocomplete.suggestion_limit",
                "Suggestion limit must be greater than 0",
            );
        }

        if self.location.geolocation_timeout_secs == 0 {
            result.add_error(
                "location.geolocation_timeout_secs",
                "Geolocation timeout must be greater than 0",
            );
        }

        if let Some(home) = self.location.home {
            if !(-90.0..=90.0).contains(&home.latitude) {
                result.add_error("location.home.latitude", "Latitude must be within -90..=90");
            }
            if !(-180.0..=180.0).contains(&home.longitude) {
                result.add_error(
                    "location.home.longitude",
                    "Longitude must be within -180..=180",
                );
            }
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("cropclock");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_default_autocomplete_timings() {
        let config = Config::default();
        assert_eq!(config.autocomplete.debounce(), Duration::from_millis(500));
        assert_eq!(config.autocomplete.min_query_chars, 3);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.endpoints.weather_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "endpoints.weather_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.endpoints.prediction_url = "ftp://localhost:8080".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeouts_are_errors() {
        let mut config = Config::default();
        config.endpoints.request_timeout_secs = 0;
        config.location.geolocation_timeout_secs = 0;
        let result = config.validate();
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_zero_debounce_is_warning() {
        let mut config = Config::default();
        config.autocomplete.debounce_ms = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "autocomplete.debounce_ms"));
    }

    #[test]
    fn test_min_query_chars() {
        let mut config = Config::default();
        config.autocomplete.min_query_chars = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].field, "autocomplete.min_query_chars");

        config.autocomplete.min_query_chars = 2;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "autocomplete.min_query_chars"));
    }

    #[test]
    fn test_home_out_of_range() {
        let mut config = Config::default();
        config.location.home = Some(HomeCoordinate {
            latitude: 95.0,
            longitude: 78.1,
        });
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "location.home.latitude"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.autocomplete.suggestion_limit, 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[location]\nhome = { latitude = 9.93, longitude = 78.12 }\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.location.home,
            Some(HomeCoordinate {
                latitude: 9.93,
                longitude: 78.12
            })
        );
        assert_eq!(config.location.geolocation_timeout_secs, 10);
        assert_eq!(config.autocomplete.debounce_ms, 500);
    }
}
