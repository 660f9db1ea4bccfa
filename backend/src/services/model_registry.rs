//! Process-wide handle to the live encoder and classifier
//!
//! Readers clone an `Arc` to an immutable snapshot; a retrain publishes a new
//! snapshot by swapping the pointer. An inference call therefore always sees
//! an encoder and a classifier that were trained together.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::ml::{CategoricalEncoder, RandomForest, TrainedModel, TrainingReport};

/// Encoder and classifier fitted together, tagged with a version
#[derive(Debug)]
pub struct ModelSnapshot {
    pub version: u64,
    pub encoder: CategoricalEncoder,
    pub forest: RandomForest,
    pub report: TrainingReport,
}

/// Public view of the live snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub version: u64,
    pub classes: Vec<String>,
    pub trees: usize,
    pub rows: usize,
    pub train_accuracy: f64,
    pub validation_accuracy: f64,
    pub trained_at: chrono::DateTime<chrono::Utc>,
}

impl ModelSnapshot {
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            version: self.version,
            classes: self.forest.classes().to_vec(),
            trees: self.forest.n_trees(),
            rows: self.report.rows,
            train_accuracy: self.report.train_accuracy,
            validation_accuracy: self.report.validation_accuracy,
            trained_at: self.report.trained_at,
        }
    }
}

pub struct ModelRegistry {
    current: RwLock<Arc<ModelSnapshot>>,
}

impl ModelRegistry {
    /// Start with version 1 of the given model
    pub fn new(encoder: CategoricalEncoder, forest: RandomForest, report: TrainingReport) -> Self {
        let snapshot = ModelSnapshot {
            version: 1,
            encoder,
            forest,
            report,
        };
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn from_trained(model: TrainedModel) -> Self {
        Self::new(model.encoder, model.forest, model.report)
    }

    /// The snapshot live at the time of the call
    pub fn current(&self) -> Arc<ModelSnapshot> {
        // A poisoned lock still guards a complete Arc
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn version(&self) -> u64 {
        self.current().version
    }

    /// Publish a freshly trained model, returning its version
    pub fn replace(&self, model: TrainedModel) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let version = guard.version + 1;
        *guard = Arc::new(ModelSnapshot {
            version,
            encoder: model.encoder,
            forest: model.forest,
            report: model.report,
        });
        version
    }
}
