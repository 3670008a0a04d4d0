//! Prediction workflows: check inputs, build the request, call the backend once.
//!
//! Each workflow publishes its latest outcome through a [`Latest`] slot, so
//! when a view submits twice only the second call's outcome is shown.

use cropclock_geo::EnvironmentSnapshot;
use cropclock_services::{
    CropRecommendation, CropRequest, EstimateNutrients, FertilizerRecommendation,
    FertilizerRequest, NutrientEstimate, NutrientEstimateRequest, PredictPrice, PredictionClient,
    PricePrediction, PriceRequest, RecommendCrop, RecommendFertilizer, Workflow,
};
use tokio::sync::watch;

use crate::agronomic::{AgronomicTriple, SharedAgronomicState};
use crate::error::OrchestratorError;
use crate::latest::Latest;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PredictionOutcome<T> {
    #[default]
    Idle,
    Pending,
    Succeeded(T),
    /// Display message, already mapped for the user
    Failed(String),
}

impl<T> PredictionOutcome<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// View-local fields of the crop form. Blank climate fields fall back to
/// the current snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CropInputs {
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FertilizerInputs {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub soil_type: String,
    pub crop_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceInputs {
    pub state: String,
    pub crop: String,
    pub season: String,
    pub month: Option<u8>,
    pub stock_kg: Option<f64>,
    pub demand_index: Option<f64>,
    pub storage_cost_index: Option<f64>,
}

pub struct PredictionOrchestrator {
    client: PredictionClient,
    state: SharedAgronomicState,
    nutrients: Latest<PredictionOutcome<NutrientEstimate>>,
    crop: Latest<PredictionOutcome<CropRecommendation>>,
    fertilizer: Latest<PredictionOutcome<FertilizerRecommendation>>,
    price: Latest<PredictionOutcome<PricePrediction>>,
}

impl PredictionOrchestrator {
    pub fn new(client: PredictionClient, state: SharedAgronomicState) -> Self {
        Self {
            client,
            state,
            nutrients: Latest::new(PredictionOutcome::Idle),
            crop: Latest::new(PredictionOutcome::Idle),
            fertilizer: Latest::new(PredictionOutcome::Idle),
            price: Latest::new(PredictionOutcome::Idle),
        }
    }

    pub fn agronomic_state(&self) -> &SharedAgronomicState {
        &self.state
    }

    /// Estimate N/P/K from the current weather and field history, then
    /// overwrite all three shared fields with the estimate. An estimate
    /// overtaken by a later one on this orchestrator writes nothing.
    pub async fn estimate_nutrients(
        &self,
        snapshot: Option<&EnvironmentSnapshot>,
        soil_type: &str,
        previous_crop: &str,
        yield_level: &str,
    ) -> Result<NutrientEstimate, OrchestratorError> {
        let request = nutrient_request(snapshot, soil_type, previous_crop, yield_level);
        self.run::<EstimateNutrients>(&self.nutrients, request, |estimate| {
            self.state.replace(AgronomicTriple {
                nitrogen: Some(estimate.nitrogen),
                phosphorus: Some(estimate.phosphorus),
                potassium: Some(estimate.potassium),
            })
        })
        .await
    }

    /// Recommend a crop from the shared triple and the form fields.
    pub async fn recommend_crop(
        &self,
        snapshot: Option<&EnvironmentSnapshot>,
        inputs: CropInputs,
    ) -> Result<String, OrchestratorError> {
        let request = crop_request(self.state.get(), snapshot, inputs);
        let recommendation = self
            .run::<RecommendCrop>(&self.crop, request, |_| {})
            .await?;
        Ok(recommendation.crop)
    }

    pub async fn recommend_fertilizer(
        &self,
        snapshot: Option<&EnvironmentSnapshot>,
        inputs: FertilizerInputs,
    ) -> Result<String, OrchestratorError> {
        let request = fertilizer_request(self.state.get(), snapshot, &inputs);
        let recommendation = self
            .run::<RecommendFertilizer>(&self.fertilizer, request, |_| {})
            .await?;
        Ok(recommendation.fertilizer)
    }

    pub async fn predict_price(
        &self,
        inputs: PriceInputs,
    ) -> Result<PricePrediction, OrchestratorError> {
        let request = price_request(&inputs);
        self.run::<PredictPrice>(&self.price, request, |_| {}).await
    }

    pub fn nutrient_outcome(&self) -> PredictionOutcome<NutrientEstimate> {
        self.nutrients.get()
    }

    pub fn crop_outcome(&self) -> PredictionOutcome<CropRecommendation> {
        self.crop.get()
    }

    pub fn fertilizer_outcome(&self) -> PredictionOutcome<FertilizerRecommendation> {
        self.fertilizer.get()
    }

    pub fn price_outcome(&self) -> PredictionOutcome<PricePrediction> {
        self.price.get()
    }

    pub fn subscribe_nutrients(&self) -> watch::Receiver<PredictionOutcome<NutrientEstimate>> {
        self.nutrients.subscribe()
    }

    pub fn subscribe_crop(&self) -> watch::Receiver<PredictionOutcome<CropRecommendation>> {
        self.crop.subscribe()
    }

    pub fn subscribe_fertilizer(
        &self,
    ) -> watch::Receiver<PredictionOutcome<FertilizerRecommendation>> {
        self.fertilizer.subscribe()
    }

    pub fn subscribe_price(&self) -> watch::Receiver<PredictionOutcome<PricePrediction>> {
        self.price.subscribe()
    }

    /// Publish `Pending`, send the request if it was built, and publish the
    /// outcome unless a later call on the same workflow has started.
    ///
    /// `on_current` sees a successful response only when it is published, so
    /// a superseded response never reaches shared state.
    async fn run<W>(
        &self,
        slot: &Latest<PredictionOutcome<W::Response>>,
        request: Result<W::Request, OrchestratorError>,
        on_current: impl FnOnce(&W::Response),
    ) -> Result<W::Response, OrchestratorError>
    where
        W: Workflow,
        W::Response: Clone,
    {
        let ticket = slot.begin(|o| *o = PredictionOutcome::Pending);

        let result = match request {
            Ok(request) => self
                .client
                .submit::<W>(&request)
                .await
                .map_err(OrchestratorError::from),
            Err(e) => {
                tracing::debug!("{} not sent: {}", W::NAME, e);
                Err(e)
            }
        };

        let outcome = match &result {
            Ok(response) => PredictionOutcome::Succeeded(response.clone()),
            Err(e) => PredictionOutcome::Failed(e.display_message()),
        };
        let committed = slot.commit(ticket, |o| {
            if let Ok(response) = &result {
                on_current(response);
            }
            *o = outcome;
        });
        if !committed {
            tracing::debug!("Dropping stale {} outcome", W::NAME);
        }
        result
    }
}

/// Needs a snapshot with temperature, humidity and precipitation.
fn nutrient_request(
    snapshot: Option<&EnvironmentSnapshot>,
    soil_type: &str,
    previous_crop: &str,
    yield_level: &str,
) -> Result<NutrientEstimateRequest, OrchestratorError> {
    let weather = snapshot
        .filter(|s| s.temperature_c.is_finite() && s.humidity_pct.is_finite())
        .and_then(|s| {
            s.precipitation_mm
                .filter(|p| p.is_finite())
                .map(|rainfall| (s.temperature_c, s.humidity_pct, rainfall))
        });
    let Some((temp_c, humidity, rainfall)) = weather else {
        return Err(OrchestratorError::precondition("weather required"));
    };

    if [soil_type, previous_crop, yield_level]
        .iter()
        .any(|s| s.trim().is_empty())
    {
        return Err(OrchestratorError::precondition("selection required"));
    }

    Ok(NutrientEstimateRequest {
        soil_type: soil_type.trim().to_string(),
        prev_crop: previous_crop.trim().to_string(),
        yield_level: yield_level.trim().to_string(),
        temp_c,
        humidity,
        rainfall,
    })
}

fn crop_request(
    triple: AgronomicTriple,
    snapshot: Option<&EnvironmentSnapshot>,
    inputs: CropInputs,
) -> Result<CropRequest, OrchestratorError> {
    Ok(CropRequest {
        nitrogen: required(triple.nitrogen, "nitrogen")?,
        phosphorus: required(triple.phosphorus, "phosphorus")?,
        potassium: required(triple.potassium, "potassium")?,
        ph: required(inputs.ph, "ph")?,
        temperature: required(
            inputs.temperature.or(snapshot.map(|s| s.temperature_c)),
            "temperature",
        )?,
        humidity: required(
            inputs.humidity.or(snapshot.map(|s| s.humidity_pct)),
            "humidity",
        )?,
        rainfall: required(
            inputs.rainfall.or(snapshot.and_then(|s| s.precipitation_mm)),
            "rainfall",
        )?,
    })
}

fn fertilizer_request(
    triple: AgronomicTriple,
    snapshot: Option<&EnvironmentSnapshot>,
    inputs: &FertilizerInputs,
) -> Result<FertilizerRequest, OrchestratorError> {
    Ok(FertilizerRequest {
        temperature: required(
            inputs.temperature.or(snapshot.map(|s| s.temperature_c)),
            "temperature",
        )?,
        humidity: required(
            inputs.humidity.or(snapshot.map(|s| s.humidity_pct)),
            "humidity",
        )?,
        soil_moisture: required(inputs.soil_moisture, "soil moisture")?,
        soil_type: required_text(&inputs.soil_type, "soil type")?,
        crop_type: required_text(&inputs.crop_type, "crop type")?,
        nitrogen: required(triple.nitrogen, "nitrogen")?,
        phosphorus: required(triple.phosphorus, "phosphorus")?,
        potassium: required(triple.potassium, "potassium")?,
    })
}

fn price_request(inputs: &PriceInputs) -> Result<PriceRequest, OrchestratorError> {
    let state = required_text(&inputs.state, "state")?;
    let crop = required_text(&inputs.crop, "crop")?;
    let season = required_text(&inputs.season, "season")?;
    let month = match inputs.month {
        None => return Err(OrchestratorError::precondition("month required")),
        Some(m) if !(1..=12).contains(&m) => {
            return Err(OrchestratorError::precondition(
                "month must be between 1 and 12",
            ))
        }
        Some(m) => m,
    };

    Ok(PriceRequest {
        state,
        crop,
        season,
        month,
        stock_kg: required(inputs.stock_kg, "stock")?,
        demand_index: required(inputs.demand_index, "demand index")?,
        storage_cost_index: required(inputs.storage_cost_index, "storage cost index")?,
    })
}

fn required(value: Option<f64>, field: &str) -> Result<f64, OrchestratorError> {
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| OrchestratorError::precondition(format!("{} required", field)))
}

fn required_text(value: &str, field: &str) -> Result<String, OrchestratorError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrchestratorError::precondition(format!("{} required", field)));
    }
    Ok(trimmed.to_string())
}
