//! Current conditions from the Open-Meteo forecast API (no key required).

use crate::types::{Coordinate, CurrentConditions, WeatherError};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// Source of current weather for a coordinate.
pub trait ConditionsSource: Send + Sync {
    async fn current_conditions(&self, at: Coordinate) -> Result<CurrentConditions, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
}

impl CurrentBlock {
    fn into_conditions(self) -> Result<CurrentConditions, WeatherError> {
        let temperature_c = self
            .temperature_2m
            .ok_or_else(|| WeatherError::DataUnavailable("temperature missing".to_string()))?;
        let humidity_pct = self
            .relative_humidity_2m
            .ok_or_else(|| WeatherError::DataUnavailable("humidity missing".to_string()))?;

        Ok(CurrentConditions {
            temperature_c,
            humidity_pct,
            precipitation_mm: self.precipitation,
            observed_at: Utc::now(),
        })
    }
}

/// HTTP weather client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl WeatherClient {
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ConditionsSource for WeatherClient {
    #[instrument(skip(self), level = "debug")]
    async fn current_conditions(&self, at: Coordinate) -> Result<CurrentConditions, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let body: ForecastResponse = self
            .client
            .get(&url)
            .query(&[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,precipitation".to_string(),
                ),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let conditions = body
            .current
            .ok_or_else(|| WeatherError::DataUnavailable("no current block".to_string()))?
            .into_conditions()?;

        tracing::debug!(
            "Conditions at {}: {}C, {}%",
            at,
            conditions.temperature_c,
            conditions.humidity_pct
        );
        Ok(conditions)
    }
}
