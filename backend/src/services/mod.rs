//! Core services of the Crop Health Advisory system

pub mod dataset;
pub mod fallback;
pub mod learning_store;
pub mod model_registry;
pub mod pipeline;
pub mod retrain;

pub use dataset::{load_dataset, write_dataset, StoreError};
pub use fallback::{parse_oracle_response, OracleAnswer, OracleFallback};
pub use learning_store::{IngestOutcome, LearningStore};
pub use model_registry::{ModelInfo, ModelRegistry, ModelSnapshot};
pub use pipeline::{AdvisoryPipeline, AdvisorySource, GateOutcome, Resolution};
pub use retrain::{RetrainError, RetrainSummary, Retrainer};
