//! Remote oracle fallback
//!
//! Asks the oracle for a label and suggestion when the local model cannot
//! answer. The oracle's text is untrusted: the first `{` to the last `}` is
//! decoded as JSON and each field falls back to a default on its own. Any
//! failure yields the defaults, and every resolved answer is handed to the
//! learning store.

use std::sync::Arc;

use serde_json::Value;

use shared::{FeatureRecord, HealthLabel};

use super::learning_store::{IngestOutcome, LearningStore};
use crate::external::TextOracle;

pub const DEFAULT_LABEL: &str = HealthLabel::Moderate.as_str();
pub const DEFAULT_SUGGESTION: &str = "Maintain regular monitoring and adjust irrigation as needed.";

/// Label and suggestion recovered from the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct OracleAnswer {
    pub label: String,
    pub suggestion: String,
}

impl Default for OracleAnswer {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            suggestion: DEFAULT_SUGGESTION.to_string(),
        }
    }
}

/// Prompt embedding every field of the record and the expected answer shape
pub fn build_prompt(record: &FeatureRecord) -> String {
    format!(
        "You are an agricultural advisor. Assess the health of this crop.\n\
         Farmer: {}\n\
         Crop: {}\n\
         Location: {}\n\
         Weather: {}\n\
         Soil type: {}\n\
         Temperature: {} C\n\
         Humidity: {} %\n\
         Rainfall: {} mm\n\
         Reply with only a JSON object of the form \
         {{\"label\": \"{}\", \"suggestion\": \"<short advice for the farmer>\"}}",
        record.farmer_name,
        record.crop_name,
        record.location,
        record.weather,
        record.soiltype,
        record.temperature,
        record.humidity,
        record.rainfall,
        HealthLabel::choices(),
    )
}

/// Extract label and suggestion from free text, defaulting what is missing
pub fn parse_oracle_response(text: &str) -> OracleAnswer {
    let object = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&text[start..=end]).ok()
        }
        _ => None,
    };
    let Some(object) = object else {
        return OracleAnswer::default();
    };

    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    OracleAnswer {
        label: field("label")
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
        suggestion: field("suggestion")
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_SUGGESTION.to_string()),
    }
}

pub struct OracleFallback {
    oracle: Arc<dyn TextOracle>,
    store: Arc<LearningStore>,
}

impl OracleFallback {
    pub fn new(oracle: Arc<dyn TextOracle>, store: Arc<LearningStore>) -> Self {
        Self { oracle, store }
    }

    pub fn model_id(&self) -> &str {
        self.oracle.model_id()
    }

    /// Ask the oracle, record the answer, and return it. Never fails.
    pub async fn resolve(&self, record: &FeatureRecord) -> OracleAnswer {
        let answer = match self.oracle.generate(&build_prompt(record)).await {
            Ok(text) => parse_oracle_response(&text),
            Err(e) => {
                tracing::error!("Oracle call failed, using defaults: {}", e);
                OracleAnswer::default()
            }
        };
        tracing::info!(label = %answer.label, "Oracle resolved observation");

        let example = record.to_training_example(answer.label.clone());
        match self.store.record_and_maybe_retrain(example).await {
            IngestOutcome::Appended { retrained: Some(summary) } => {
                tracing::info!("Learned from oracle answer, model version {}", summary.version)
            }
            IngestOutcome::Appended { retrained: None } => {
                tracing::warn!("Oracle answer stored but the model was not retrained")
            }
            IngestOutcome::Duplicate | IngestOutcome::Failed => {}
        }

        answer
    }
}
