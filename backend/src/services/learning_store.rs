//! Continual learning store
//!
//! Oracle-labelled observations are appended to the dataset with
//! deduplication, and each new row triggers a retrain. Append and retrain
//! run under one async mutex whose guard travels into the blocking task, so
//! the lock is held until the work finishes even if the caller gives up
//! waiting. Concurrent fallbacks never race on the dataset file and at most
//! one retrain executes at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use shared::{contains_observation, TrainingExample};

use super::dataset::{load_dataset, write_dataset, StoreError};
use super::retrain::{RetrainSummary, Retrainer};

/// What happened to an ingested example
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Row appended; `retrained` carries the new model if the refit succeeded
    Appended { retrained: Option<RetrainSummary> },
    /// An equivalent observation was already stored
    Duplicate,
    /// Dataset could not be read or written; nothing changed
    Failed,
}

pub struct LearningStore {
    dataset_path: PathBuf,
    retrainer: Arc<Retrainer>,
    write_lock: Arc<Mutex<()>>,
}

impl LearningStore {
    pub fn new(dataset_path: impl Into<PathBuf>, retrainer: Arc<Retrainer>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            retrainer,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append `example` unless its observation is already stored, then
    /// retrain. Never fails: I/O and retrain errors are logged and the
    /// caller carries on.
    pub async fn record_and_maybe_retrain(&self, example: TrainingExample) -> IngestOutcome {
        let guard = Arc::clone(&self.write_lock).lock_owned().await;

        let path = self.dataset_path.clone();
        let retrainer = Arc::clone(&self.retrainer);
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            ingest(&path, example, &retrainer)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Dataset update task failed: {}", e);
                IngestOutcome::Failed
            }
        }
    }
}

fn ingest(path: &Path, example: TrainingExample, retrainer: &Retrainer) -> IngestOutcome {
    match append_unique(path, example) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Duplicate observation, dataset unchanged");
            return IngestOutcome::Duplicate;
        }
        Err(e) => {
            tracing::error!("Dataset update failed: {}", e);
            return IngestOutcome::Failed;
        }
    }

    let retrained = match retrainer.retrain() {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::error!("Retrain failed, keeping the current model: {}", e);
            None
        }
    };
    IngestOutcome::Appended { retrained }
}

/// Returns whether the row was added
fn append_unique(path: &Path, example: TrainingExample) -> Result<bool, StoreError> {
    let mut rows = load_dataset(path)?;
    if contains_observation(&rows, &example) {
        return Ok(false);
    }
    tracing::info!(
        crop = %example.crop_name,
        location = %example.location,
        label = %example.label,
        "Appending observation to dataset"
    );
    rows.push(example);
    write_dataset(path, &rows)?;
    Ok(true)
}
