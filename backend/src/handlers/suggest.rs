//! HTTP handler for advisory requests

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use shared::{normalize_request, weather_summary, FeatureRecord, RequestError};

use crate::error::AppResult;
use crate::services::AdvisorySource;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub prediction: String,
    pub suggestion: String,
    pub processed_data: FeatureRecord,
    pub weather_summary: String,
    pub source: AdvisorySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Parse the raw body; an empty body counts as missing input
fn parse_body(body: &[u8]) -> Result<Value, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RequestError::Empty);
    }
    serde_json::from_slice(body).map_err(|e| RequestError::Malformed(e.to_string()))
}

/// Resolve a crop-health label and advisory for one observation
pub async fn suggest(State(state): State<AppState>, body: Bytes) -> AppResult<Json<SuggestResponse>> {
    let record = normalize_request(parse_body(&body)?)?;
    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        crop = %record.crop_name,
        location = %record.location,
        soil = %record.soiltype,
        "Advisory requested"
    );

    let resolution = state.pipeline.suggest(&record).await;
    let summary = weather_summary(&record);
    tracing::info!(
        %request_id,
        prediction = %resolution.label,
        source = ?resolution.source,
        "Advisory resolved"
    );

    Ok(Json(SuggestResponse {
        prediction: resolution.label,
        suggestion: resolution.suggestion,
        processed_data: record,
        weather_summary: summary,
        source: resolution.source,
        confidence: resolution.confidence,
    }))
}
