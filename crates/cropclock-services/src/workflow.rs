//! Request and response shapes for each prediction endpoint.
//!
//! Field names follow the backend's model schemas exactly, which is why
//! casing differs between workflows.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Describes one backend prediction endpoint.
pub trait Workflow {
    /// Used in logs and spans
    const NAME: &'static str;
    /// Path relative to the backend base URL
    const PATH: &'static str;

    type Request: Serialize + std::fmt::Debug + Sync;
    type Response: DeserializeOwned;
}

/// Estimate soil N/P/K from weather and field history.
#[derive(Debug, Clone, Copy)]
pub struct EstimateNutrients;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientEstimateRequest {
    pub soil_type: String,
    pub prev_crop: String,
    pub yield_level: String,
    pub temp_c: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NutrientEstimate {
    #[serde(rename = "N", deserialize_with = "number_or_string")]
    pub nitrogen: f64,
    #[serde(rename = "P", deserialize_with = "number_or_string")]
    pub phosphorus: f64,
    #[serde(rename = "K", deserialize_with = "number_or_string")]
    pub potassium: f64,
}

impl Workflow for EstimateNutrients {
    const NAME: &'static str = "nutrient_estimate";
    const PATH: &'static str = "/estimate_npk";
    type Request = NutrientEstimateRequest;
    type Response = NutrientEstimate;
}

/// Recommend the best crop for soil and climate.
#[derive(Debug, Clone, Copy)]
pub struct RecommendCrop;

/// Unlike the other workflows, the crop model takes nutrient names spelled out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRequest {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropRecommendation {
    #[serde(alias = "prediction")]
    pub crop: String,
}

impl Workflow for RecommendCrop {
    const NAME: &'static str = "crop";
    const PATH: &'static str = "/predict";
    type Request = CropRequest;
    type Response = CropRecommendation;
}

/// Recommend a fertilizer for a crop on a given soil.
#[derive(Debug, Clone, Copy)]
pub struct RecommendFertilizer;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRequest {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Soil_Moisture")]
    pub soil_moisture: f64,
    #[serde(rename = "Soil_Type")]
    pub soil_type: String,
    #[serde(rename = "Crop_Type")]
    pub crop_type: String,
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FertilizerRecommendation {
    #[serde(alias = "prediction")]
    pub fertilizer: String,
}

impl Workflow for RecommendFertilizer {
    const NAME: &'static str = "fertilizer";
    const PATH: &'static str = "/predict_fertilizer";
    type Request = FertilizerRequest;
    type Response = FertilizerRecommendation;
}

/// Forecast a market price per quintal.
#[derive(Debug, Clone, Copy)]
pub struct PredictPrice;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRequest {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Season")]
    pub season: String,
    /// 1 = January
    #[serde(rename = "Month")]
    pub month: u8,
    #[serde(rename = "Stock_kg")]
    pub stock_kg: f64,
    #[serde(rename = "Demand_Index")]
    pub demand_index: f64,
    #[serde(rename = "Storage_Cost_Index")]
    pub storage_cost_index: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePrediction {
    #[serde(deserialize_with = "number_or_string")]
    pub price_per_quintal: f64,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl Workflow for PredictPrice {
    const NAME: &'static str = "price";
    const PATH: &'static str = "/predict_price";
    type Request = PriceRequest;
    type Response = PricePrediction;
}

/// Some model servers serialize numpy floats as strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrient_request_field_names() {
        let req = NutrientEstimateRequest {
            soil_type: "Clay".to_string(),
            prev_crop: "Rice".to_string(),
            yield_level: "High".to_string(),
            temp_c: 28.5,
            humidity: 70.0,
            rainfall: 1.2,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["soilType"], "Clay");
        assert_eq!(json["prevCrop"], "Rice");
        assert_eq!(json["yieldLevel"], "High");
        assert_eq!(json["tempC"], 28.5);
    }

    #[test]
    fn test_crop_request_field_names() {
        let req = CropRequest {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            temperature: 26.0,
            humidity: 80.0,
            ph: 6.5,
            rainfall: 200.0,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["nitrogen"], 90.0);
        assert_eq!(json["phosphorus"], 42.0);
        assert_eq!(json["potassium"], 43.0);
        assert_eq!(json["ph"], 6.5);
        assert!(json.get("N").is_none());
    }

    #[test]
    fn test_fertilizer_request_field_names() {
        let req = FertilizerRequest {
            temperature: 26.0,
            humidity: 52.0,
            soil_moisture: 38.0,
            soil_type: "Sandy".to_string(),
            crop_type: "Maize".to_string(),
            nitrogen: 37.0,
            phosphorus: 0.0,
            potassium: 0.0,
        };

        let json = serde_json::to_value(&req).unwrap();
        for key in [
            "Temperature",
            "Humidity",
            "Soil_Moisture",
            "Soil_Type",
            "Crop_Type",
            "N",
            "P",
            "K",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_price_request_field_names() {
        let req = PriceRequest {
            state: "Tamil Nadu".to_string(),
            crop: "Rice".to_string(),
            season: "Kharif".to_string(),
            month: 7,
            stock_kg: 1000.0,
            demand_index: 8.0,
            storage_cost_index: 2.0,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["State"], "Tamil Nadu");
        assert_eq!(json["Month"], 7);
        assert_eq!(json["Stock_kg"], 1000.0);
        assert_eq!(json["Demand_Index"], 8.0);
        assert_eq!(json["Storage_Cost_Index"], 2.0);
    }

    #[test]
    fn test_crop_response_accepts_prediction_alias() {
        let rec: CropRecommendation =
            serde_json::from_value(serde_json::json!({ "prediction": "maize" })).unwrap();
        assert_eq!(rec.crop, "maize");
    }

    #[test]
    fn test_price_accepts_string_number() {
        let price: PricePrediction = serde_json::from_value(serde_json::json!({
            "price_per_quintal": "2450.75",
            "recommendation": "Hold stock for two weeks"
        }))
        .unwrap();
        assert_eq!(price.price_per_quintal, 2450.75);
        assert_eq!(price.recommendation.as_deref(), Some("Hold stock for two weeks"));
    }

    #[test]
    fn test_nutrient_estimate_parses() {
        let est: NutrientEstimate =
            serde_json::from_value(serde_json::json!({ "N": 82.5, "P": 40, "K": "38" })).unwrap();
        assert_eq!(est.nitrogen, 82.5);
        assert_eq!(est.phosphorus, 40.0);
        assert_eq!(est.potassium, 38.0);
    }
}
