//! Confidence-gated advisory pipeline
//!
//! The local model answers first. A confident prediction is turned into an
//! advisory by the template engine; a low-confidence prediction or any
//! inference failure hands the record to the oracle fallback, whose answer
//! is returned as is.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use shared::{build_advisory, variant_count, FeatureRecord};

use super::fallback::OracleFallback;
use super::model_registry::{ModelRegistry, ModelSnapshot};
use crate::ml::{EncoderError, ModelError, Prediction};

/// Default confidence below which the oracle takes over
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Encoding failed: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Prediction failed: {0}")]
    Model(#[from] ModelError),
}

/// Where the final answer came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorySource {
    Local,
    Oracle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    LowConfidence(f64),
    InferenceFailed(InferenceError),
}

/// Decision of the confidence gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Accept(Prediction),
    Fallback(FallbackReason),
}

/// Final label and advisory for a request
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub label: String,
    pub suggestion: String,
    pub source: AdvisorySource,
    /// Local confidence; absent when the oracle answered
    pub confidence: Option<f64>,
    pub model_version: u64,
}

/// Encode the record and run the classifier of one snapshot
pub fn local_predict(
    snapshot: &ModelSnapshot,
    record: &FeatureRecord,
) -> Result<Prediction, InferenceError> {
    let categorical = snapshot.encoder.encode(
        &record.crop_name,
        &record.location,
        &record.weather,
        &record.soiltype,
    )?;
    let mut row = categorical.to_vec();
    row.extend([record.temperature, record.humidity, record.rainfall]);
    Ok(snapshot.forest.predict(&row)?)
}

/// Accept at or above `threshold`, fall back below it or on failure
pub fn gate(threshold: f64, result: Result<Prediction, InferenceError>) -> GateOutcome {
    match result {
        Ok(prediction) if prediction.confidence >= threshold => GateOutcome::Accept(prediction),
        Ok(prediction) => GateOutcome::Fallback(FallbackReason::LowConfidence(prediction.confidence)),
        Err(e) => GateOutcome::Fallback(FallbackReason::InferenceFailed(e)),
    }
}

pub struct AdvisoryPipeline {
    registry: Arc<ModelRegistry>,
    fallback: Arc<OracleFallback>,
    threshold: f64,
}

impl AdvisoryPipeline {
    pub fn new(registry: Arc<ModelRegistry>, fallback: Arc<OracleFallback>, threshold: f64) -> Self {
        Self {
            registry,
            fallback,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn oracle_model(&self) -> &str {
        self.fallback.model_id()
    }

    /// Resolve a label and advisory. Always produces an answer.
    pub async fn suggest(&self, record: &FeatureRecord) -> Resolution {
        let snapshot = self.registry.current();
        let outcome = gate(self.threshold, local_predict(&snapshot, record));

        match outcome {
            GateOutcome::Accept(prediction) => {
                tracing::info!(
                    label = %prediction.label,
                    confidence = prediction.confidence,
                    model_version = snapshot.version,
                    "Local prediction accepted"
                );
                let variant = rand::thread_rng().gen_range(0..variant_count(&prediction.label).max(1));
                let suggestion = build_advisory(&prediction.label, record, variant);
                Resolution {
                    label: prediction.label,
                    suggestion,
                    source: AdvisorySource::Local,
                    confidence: Some(prediction.confidence),
                    model_version: snapshot.version,
                }
            }
            GateOutcome::Fallback(reason) => {
                match &reason {
                    FallbackReason::LowConfidence(confidence) => tracing::info!(
                        confidence,
                        threshold = self.threshold,
                        "Low confidence, falling back to oracle"
                    ),
                    FallbackReason::InferenceFailed(e) => {
                        tracing::warn!("Local inference failed, falling back to oracle: {}", e)
                    }
                }
                drop(snapshot);

                let answer = self.fallback.resolve(record).await;
                Resolution {
                    label: answer.label,
                    suggestion: answer.suggestion,
                    source: AdvisorySource::Oracle,
                    confidence: None,
                    model_version: self.registry.version(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(confidence: f64) -> Prediction {
        Prediction {
            label: "healthy".into(),
            confidence,
        }
    }

    #[test]
    fn test_gate_accepts_at_threshold() {
        assert_eq!(
            gate(0.5, Ok(prediction(0.5))),
            GateOutcome::Accept(prediction(0.5))
        );
        assert!(matches!(gate(0.5, Ok(prediction(0.9))), GateOutcome::Accept(_)));
    }

    #[test]
    fn test_gate_falls_back_below_threshold() {
        assert_eq!(
            gate(0.5, Ok(prediction(0.49))),
            GateOutcome::Fallback(FallbackReason::LowConfidence(0.49))
        );
    }

    #[test]
    fn test_gate_falls_back_on_inference_error() {
        let error = InferenceError::Model(ModelError::NoTrees);
        assert_eq!(
            gate(0.5, Err(error.clone())),
            GateOutcome::Fallback(FallbackReason::InferenceFailed(error))
        );
    }

    #[test]
    fn test_threshold_is_configurable() {
        assert!(matches!(gate(0.9, Ok(prediction(0.8))), GateOutcome::Fallback(_)));
        assert!(matches!(gate(0.1, Ok(prediction(0.2))), GateOutcome::Accept(_)));
    }

    #[test]
    fn test_source_serializes_lowercase() {
        assert_eq!(serde_json::to_value(AdvisorySource::Oracle).unwrap(), "oracle");
    }
}
