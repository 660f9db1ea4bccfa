//! Remote text oracle abstraction and startup model selection

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleError {
    #[error("Oracle API key is not configured")]
    MissingApiKey,

    #[error("Oracle request timed out")]
    Timeout,

    #[error("Could not reach oracle: {0}")]
    Connection(String),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle response could not be decoded: {0}")]
    Decode(String),

    #[error("Oracle response contained no text")]
    EmptyResponse,

    #[error("None of the configured oracle models responded")]
    NoWorkingModel,
}

impl OracleError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::Timeout | OracleError::Connection(_) => true,
            OracleError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A generative model answering free-text prompts
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Identifier of the model behind this oracle
    fn model_id(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Cheap capability check for a candidate model
#[async_trait]
pub trait ModelProbe: Send + Sync {
    async fn probe(&self, model: &str) -> Result<(), OracleError>;
}

/// Pick the first candidate that answers the probe.
///
/// Runs once at startup; the chosen identifier is kept for the process
/// lifetime. Fails when no candidate responds.
pub async fn resolve_model<P>(probe: &P, candidates: &[String]) -> Result<String, OracleError>
where
    P: ModelProbe + ?Sized,
{
    for model in candidates {
        tracing::info!("Probing oracle model {}", model);
        match probe.probe(model).await {
            Ok(()) => {
                tracing::info!("Using oracle model {}", model);
                return Ok(model.clone());
            }
            Err(e) => {
                let message: String = e.to_string().chars().take(80).collect();
                tracing::warn!("Oracle model {} unavailable: {}", model, message);
            }
        }
    }
    Err(OracleError::NoWorkingModel)
}
