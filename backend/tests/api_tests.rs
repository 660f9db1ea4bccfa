//! HTTP surface tests

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;

use serde_json::{json, Value};
use tower::ServiceExt;

use common::{Harness, StubOracle};
use crop_advisory::ml::RandomForest;
use crop_advisory::services::ModelRegistry;
use crop_advisory::{create_app, AppState};

fn app(harness: &Harness) -> Router {
    let oracle = StubOracle::replying("{\"label\":\"stress\",\"suggestion\":\"Irrigate tonight\"}");
    create_app(harness.state(oracle))
}

async fn send(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn json_body(value: Value) -> Body {
    Body::from(value.to_string())
}

#[tokio::test]
async fn suggest_returns_local_advisory() {
    let harness = Harness::new(0.0);
    let (status, body) = send(
        app(&harness),
        "POST",
        "/suggest",
        json_body(json!({
            "Crop": "Rice",
            "Location": "Delta",
            "Weather": "Sunny",
            "Soil": "Clay",
            "temperature": "25",
            "humidity": 80,
            "rainfall": 103,
            "farmer_name": "Asha"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "healthy");
    assert_eq!(body["source"], "local");
    assert!(body["confidence"].is_number());
    assert_eq!(body["processed_data"]["crop_name"], "rice");
    assert_eq!(body["processed_data"]["soiltype"], "clay");
    assert_eq!(body["processed_data"]["temperature"], 25.0);
    assert!(body["suggestion"].as_str().unwrap().contains("Asha"));
    assert!(body["weather_summary"].as_str().unwrap().contains("reduce irrigation"));
}

#[tokio::test]
async fn versioned_route_uses_oracle_below_threshold() {
    let harness = Harness::new(1.01);
    let (status, body) = send(
        app(&harness),
        "POST",
        "/api/v1/suggest",
        json_body(json!({"crop": "maize", "location": "delta", "soil": "loamy", "rainfall": 12})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "stress");
    assert_eq!(body["suggestion"], "Irrigate tonight");
    assert_eq!(body["source"], "oracle");
    assert!(body.get("confidence").is_none());
}

#[tokio::test]
async fn missing_required_field_is_rejected() {
    let harness = Harness::new(0.5);
    let (status, body) = send(
        app(&harness),
        "POST",
        "/suggest",
        json_body(json!({"crop": "rice", "location": "delta"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: soil");
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let harness = Harness::new(0.5);
    let (status, body) = send(app(&harness), "POST", "/suggest", Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No input data provided");
}

#[tokio::test]
async fn unparsable_number_is_rejected() {
    let harness = Harness::new(0.5);
    let (status, body) = send(
        app(&harness),
        "POST",
        "/suggest",
        json_body(json!({"crop": "rice", "location": "delta", "soil": "clay", "humidity": "wet"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "humidity");
}

#[tokio::test]
async fn health_reports_model_and_oracle() {
    let harness = Harness::new(0.5);
    let (status, body) = send(app(&harness), "GET", "/health", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_version"], 1);
    assert_eq!(body["oracle_model"], "stub-model");
}

#[tokio::test]
async fn model_endpoint_describes_snapshot() {
    let harness = Harness::new(0.5);
    let (status, body) = send(app(&harness), "GET", "/api/v1/model", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);
    assert_eq!(body["classes"], json!(["healthy", "moderate", "stress"]));
    assert_eq!(body["rows"], 24);
    assert_eq!(body["confidence_threshold"], 0.5);
}

#[tokio::test]
async fn model_endpoint_reports_unservable_model() {
    let harness = Harness::new(0.5);
    let live = harness.registry.current();
    let treeless = RandomForest::from_trees(live.forest.classes().to_vec(), live.forest.n_features(), Vec::new());
    let registry = Arc::new(ModelRegistry::new(live.encoder.clone(), treeless, live.report.clone()));
    let app = create_app(AppState::new(harness.config.clone(), registry, StubOracle::replying("{}")));

    let (status, body) = send(app, "GET", "/api/v1/model", Body::empty()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "MODEL_UNAVAILABLE");
    assert_eq!(body["error"], "Model unavailable: Model holds no trees");
}
