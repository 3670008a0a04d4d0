//! Integration tests for PredictionClient against a mock backend.

use std::time::Duration;

use cropclock_services::{
    ClientError, CropRequest, EstimateNutrients, NutrientEstimateRequest, PredictPrice,
    PredictionClient, PriceRequest, RecommendCrop,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> PredictionClient {
    PredictionClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn crop_request() -> CropRequest {
    CropRequest {
        nitrogen: 90.0,
        phosphorus: 42.0,
        potassium: 43.0,
        temperature: 26.0,
        humidity: 80.0,
        ph: 6.5,
        rainfall: 200.0,
    }
}

#[tokio::test]
async fn test_crop_prediction_posts_schema_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "nitrogen": 90.0, "phosphorus": 42.0, "potassium": 43.0,
            "temperature": 26.0, "humidity": 80.0, "ph": 6.5, "rainfall": 200.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "crop": "rice" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rec = client_for(&mock_server)
        .submit::<RecommendCrop>(&crop_request())
        .await
        .unwrap();

    assert_eq!(rec.crop, "rice");
}

#[tokio::test]
async fn test_nutrient_estimate_roundtrip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/estimate_npk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "N": 75.2, "P": 38.0, "K": 41.5 })),
        )
        .mount(&mock_server)
        .await;

    let request = NutrientEstimateRequest {
        soil_type: "Loamy".to_string(),
        prev_crop: "Wheat".to_string(),
        yield_level: "Medium".to_string(),
        temp_c: 27.0,
        humidity: 65.0,
        rainfall: 3.4,
    };

    let estimate = client_for(&mock_server)
        .submit::<EstimateNutrients>(&request)
        .await
        .unwrap();

    assert_eq!(estimate.nitrogen, 75.2);
    assert_eq!(estimate.potassium, 41.5);
}

#[tokio::test]
async fn test_backend_error_is_surfaced_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict_price"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Unknown crop: Barley" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = PriceRequest {
        state: "Kerala".to_string(),
        crop: "Barley".to_string(),
        season: "Rabi".to_string(),
        month: 1,
        stock_kg: 500.0,
        demand_index: 5.0,
        storage_cost_index: 3.0,
    };

    let err = client_for(&mock_server)
        .submit::<PredictPrice>(&request)
        .await
        .unwrap_err();

    match err {
        ClientError::Backend(msg) => assert_eq!(msg, "Unknown crop: Barley"),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_failure_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .submit::<RecommendCrop>(&crop_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let client = PredictionClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    let err = client
        .submit::<RecommendCrop>(&crop_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
}
