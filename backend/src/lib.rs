//! Crop Health Advisory service
//!
//! Gives a crop-health label and a farming advisory for a field observation.
//! A locally trained classifier answers first; low-confidence cases go to a
//! remote generative oracle whose answers are stored and used to retrain the
//! local model.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod logging;
pub mod ml;
pub mod routes;
pub mod services;

pub use config::Config;

use external::TextOracle;
use services::{AdvisoryPipeline, LearningStore, ModelRegistry, OracleFallback, Retrainer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AdvisoryPipeline>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire registry, retrainer, learning store, fallback and gate together
    pub fn new(config: Config, registry: Arc<ModelRegistry>, oracle: Arc<dyn TextOracle>) -> Self {
        let retrainer = Arc::new(Retrainer::new(
            &config.data.dataset_path,
            config.data.artifact_paths(),
            config.training.params(),
            Arc::clone(&registry),
        ));
        let store = Arc::new(LearningStore::new(&config.data.dataset_path, retrainer));
        let fallback = Arc::new(OracleFallback::new(oracle, store));
        let pipeline = AdvisoryPipeline::new(
            registry,
            fallback,
            config.inference.confidence_threshold,
        );

        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .route("/suggest", post(handlers::suggest))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Crop Health Advisory API v1.0"
}
