//! Fitting the encoder and classifier from a dataset

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::TrainingExample;

use super::encoder::{CategoricalEncoder, EncoderError};
use super::forest::{ForestParams, ModelError, RandomForest};
use super::split::{stratified_split, SplitError};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Stratified split failed: {0}")]
    Split(#[from] SplitError),

    #[error("Encoding failed: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Classifier fit failed: {0}")]
    Model(#[from] ModelError),
}

/// Hyperparameters for a full training run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrainingParams {
    pub forest: ForestParams,
    pub validation_fraction: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            validation_fraction: 0.2,
        }
    }
}

/// Summary of a training run, kept alongside the classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub classes: Vec<String>,
    pub train_accuracy: f64,
    pub validation_accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

/// Encoder and classifier fitted together
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub encoder: CategoricalEncoder,
    pub forest: RandomForest,
    pub report: TrainingReport,
}

/// Fit a fresh encoder and forest.
///
/// The encoder learns every category in the dataset; the forest is fitted on
/// the training half of a stratified split and scored on both halves.
pub fn train_model(
    examples: &[TrainingExample],
    params: &TrainingParams,
) -> Result<TrainedModel, TrainingError> {
    if examples.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let encoder = CategoricalEncoder::fit(examples);
    let rows = examples
        .iter()
        .map(|example| encoder.feature_row(example))
        .collect::<Result<Vec<_>, _>>()?;
    let labels: Vec<String> = examples.iter().map(|e| e.label.clone()).collect();

    let split = stratified_split(&labels, params.validation_fraction, params.forest.seed)?;
    let pick = |indices: &[usize]| -> (Vec<Vec<f64>>, Vec<String>) {
        indices
            .iter()
            .map(|&i| (rows[i].clone(), labels[i].clone()))
            .unzip()
    };
    let (train_rows, train_labels) = pick(&split.train);
    let (validation_rows, validation_labels) = pick(&split.validation);

    let forest = RandomForest::fit(&train_rows, &train_labels, &params.forest)?;
    let train_accuracy = forest.accuracy(&train_rows, &train_labels)?;
    let validation_accuracy = forest.accuracy(&validation_rows, &validation_labels)?;

    let report = TrainingReport {
        rows: examples.len(),
        train_rows: train_rows.len(),
        validation_rows: validation_rows.len(),
        classes: forest.classes().to_vec(),
        train_accuracy,
        validation_accuracy,
        trained_at: Utc::now(),
    };

    Ok(TrainedModel {
        encoder,
        forest,
        report,
    })
}
