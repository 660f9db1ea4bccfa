//! Live model metadata

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::services::ModelInfo;
use crate::AppState;

#[derive(Serialize)]
pub struct ModelResponse {
    #[serde(flatten)]
    pub model: ModelInfo,
    pub confidence_threshold: f64,
}

/// Describe the snapshot currently serving predictions; 503 if it cannot
/// serve any
pub async fn model_info(State(state): State<AppState>) -> AppResult<Json<ModelResponse>> {
    let snapshot = state.pipeline.registry().current();
    snapshot
        .forest
        .validate()
        .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

    Ok(Json(ModelResponse {
        model: snapshot.info(),
        confidence_threshold: state.pipeline.threshold(),
    }))
}
