//! Retrain job: refit from the full dataset and publish the new model

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::ml::{train_model, ArtifactError, ArtifactPaths, TrainingError, TrainingParams};

use super::dataset::{load_dataset, StoreError};
use super::model_registry::ModelRegistry;

#[derive(Debug, Error)]
pub enum RetrainError {
    #[error("Failed to load dataset: {0}")]
    Dataset(#[from] StoreError),

    #[error("Training failed: {0}")]
    Training(#[from] TrainingError),

    #[error("Failed to persist artifacts: {0}")]
    Artifacts(#[from] ArtifactError),
}

/// Outcome of a successful retrain
#[derive(Debug, Clone, PartialEq)]
pub struct RetrainSummary {
    pub version: u64,
    pub rows: usize,
    pub train_accuracy: f64,
    pub validation_accuracy: f64,
}

pub struct Retrainer {
    dataset_path: PathBuf,
    artifacts: ArtifactPaths,
    params: TrainingParams,
    registry: Arc<ModelRegistry>,
}

impl Retrainer {
    pub fn new(
        dataset_path: impl Into<PathBuf>,
        artifacts: ArtifactPaths,
        params: TrainingParams,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            artifacts,
            params,
            registry,
        }
    }

    /// Reload the dataset, refit encoder and classifier, write both
    /// artifacts, then swap the live model.
    ///
    /// Any failure leaves the live model and the artifacts on disk as they
    /// were. Blocking; call from a blocking context.
    pub fn retrain(&self) -> Result<RetrainSummary, RetrainError> {
        let examples = load_dataset(&self.dataset_path)?;
        let model = train_model(&examples, &self.params)?;

        let report = model.report.clone();
        self.artifacts.save(&model)?;
        let version = self.registry.replace(model);

        tracing::info!(
            version,
            rows = report.rows,
            train_accuracy = report.train_accuracy,
            validation_accuracy = report.validation_accuracy,
            "Model retrained"
        );

        Ok(RetrainSummary {
            version,
            rows: report.rows,
            train_accuracy: report.train_accuracy,
            validation_accuracy: report.validation_accuracy,
        })
    }
}
