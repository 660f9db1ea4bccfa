//! Route definitions for the Crop Health Advisory service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/suggest", post(handlers::suggest))
        .route("/model", get(handlers::model_info))
}
