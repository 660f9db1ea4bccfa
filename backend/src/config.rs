//! Configuration management for the Crop Health Advisory service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with CHA_ prefix

use std::path::PathBuf;
use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::ml::{ArtifactPaths, ForestParams, TrainingParams};
use crate::services::pipeline::DEFAULT_CONFIDENCE_THRESHOLD;

/// Oracle models tried in order at startup
pub const DEFAULT_ORACLE_MODELS: [&str; 6] = [
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "models/gemini-2.5-pro",
    "models/gemini-2.5-flash",
    "models/gemini-2.5-flash-lite",
];

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Dataset and model artifact locations
    pub data: DataConfig,

    /// Confidence gate configuration
    pub inference: InferenceConfig,

    /// Retraining hyperparameters
    pub training: TrainingConfig,

    /// Remote oracle configuration
    pub oracle: OracleConfig,

    /// Event log configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// CSV dataset of labelled observations
    pub dataset_path: PathBuf,

    /// Serialized classifier
    pub model_path: PathBuf,

    /// Serialized categorical encoder
    pub encoder_path: PathBuf,
}

impl DataConfig {
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_path, &self.encoder_path)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    /// Local predictions below this confidence go to the oracle
    pub confidence_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub validation_fraction: f64,
    pub seed: u64,
}

impl TrainingConfig {
    pub fn params(&self) -> TrainingParams {
        TrainingParams {
            forest: ForestParams {
                n_estimators: self.n_estimators,
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                seed: self.seed,
            },
            validation_fraction: self.validation_fraction,
        }
    }
}

fn default_oracle_models() -> Vec<String> {
    DEFAULT_ORACLE_MODELS.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    /// API key; falls back to GOOGLE_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// Generative language API base URL
    pub base_url: String,

    /// Candidate model identifiers, in preference order
    #[serde(default = "default_oracle_models")]
    pub models: Vec<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt
    pub max_retries: u32,

    pub initial_retry_delay_ms: u64,

    pub max_retry_delay_ms: u64,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured key, or GOOGLE_API_KEY from the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Append-only event log file
    pub event_log_path: PathBuf,

    /// Default tracing filter when RUST_LOG is unset
    pub filter: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CHA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("data.dataset_path", "sample_data.csv")?
            .set_default("data.model_path", "crop_model.json")?
            .set_default("data.encoder_path", "encoders.json")?
            .set_default("inference.confidence_threshold", DEFAULT_CONFIDENCE_THRESHOLD)?
            .set_default("training.n_estimators", 200)?
            .set_default("training.max_depth", 8)?
            .set_default("training.min_samples_split", 2)?
            .set_default("training.validation_fraction", 0.2)?
            .set_default("training.seed", 42)?
            .set_default(
                "oracle.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("oracle.timeout_secs", 30)?
            .set_default("oracle.max_retries", 2)?
            .set_default("oracle.initial_retry_delay_ms", 500)?
            .set_default("oracle.max_retry_delay_ms", 5000)?
            .set_default("logging.event_log_path", "system_log.txt")?
            .set_default("logging.filter", "crop_advisory=info,tower_http=info")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CHA_ prefix)
            .add_source(
                Environment::with_prefix("CHA")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("oracle.models"),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.inference.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Message(format!(
                "inference.confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        let fraction = self.training.validation_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::Message(format!(
                "training.validation_fraction must be within (0, 1), got {}",
                fraction
            )));
        }
        if self.training.n_estimators == 0 {
            return Err(ConfigError::Message(
                "training.n_estimators must be at least 1".into(),
            ));
        }
        if self.oracle.models.is_empty() {
            return Err(ConfigError::Message(
                "oracle.models must list at least one model".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}
