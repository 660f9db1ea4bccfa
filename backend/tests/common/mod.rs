//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use crop_advisory::config::{
    Config, DataConfig, InferenceConfig, LoggingConfig, OracleConfig, ServerConfig, TrainingConfig,
    DEFAULT_ORACLE_MODELS,
};
use crop_advisory::external::{OracleError, TextOracle};
use crop_advisory::ml::train_model;
use crop_advisory::services::{write_dataset, LearningStore, ModelRegistry, Retrainer};
use crop_advisory::AppState;
use shared::TrainingExample;

/// Oracle returning a canned reply and counting calls
pub struct StubOracle {
    reply: Result<String, OracleError>,
    calls: AtomicUsize,
}

impl StubOracle {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: OracleError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextOracle for StubOracle {
    fn model_id(&self) -> &str {
        "stub-model"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub fn example(
    crop: &str,
    location: &str,
    weather: &str,
    soil: &str,
    temperature: f64,
    humidity: f64,
    rainfall: f64,
    label: &str,
) -> TrainingExample {
    TrainingExample {
        crop_name: crop.into(),
        location: location.into(),
        weather: weather.into(),
        soiltype: soil.into(),
        temperature,
        humidity,
        rainfall,
        label: label.into(),
    }
}

/// Three well separated classes, eight rows each
pub fn seed_examples() -> Vec<TrainingExample> {
    let mut rows = Vec::new();
    for i in 0..8 {
        let step = i as f64;
        rows.push(example("rice", "delta", "sunny", "clay", 25.0, 80.0, 100.0 + step, "healthy"));
        rows.push(example("wheat", "plains", "dry", "sandy", 38.0, 30.0, 1.0 + step, "stress"));
        rows.push(example("maize", "hills", "cloudy", "loamy", 30.0, 55.0, 40.0 + step, "moderate"));
    }
    rows
}

pub fn test_config(dir: &Path, threshold: f64) -> Config {
    Config {
        environment: "test".into(),
        server: ServerConfig::default(),
        data: DataConfig {
            dataset_path: dir.join("sample_data.csv"),
            model_path: dir.join("crop_model.json"),
            encoder_path: dir.join("encoders.json"),
        },
        inference: InferenceConfig {
            confidence_threshold: threshold,
        },
        training: TrainingConfig {
            n_estimators: 10,
            max_depth: 8,
            min_samples_split: 2,
            validation_fraction: 0.2,
            seed: 42,
        },
        oracle: OracleConfig {
            api_key: Some("test-key".into()),
            base_url: "http://127.0.0.1:9".into(),
            models: DEFAULT_ORACLE_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout_secs: 1,
            max_retries: 0,
            initial_retry_delay_ms: 1,
            max_retry_delay_ms: 1,
        },
        logging: LoggingConfig {
            event_log_path: dir.join("system_log.txt"),
            filter: "info".into(),
        },
    }
}

/// Temp workspace with a seeded dataset, trained artifacts and a live registry
pub struct Harness {
    pub dir: TempDir,
    pub config: Config,
    pub registry: Arc<ModelRegistry>,
}

impl Harness {
    pub fn new(threshold: f64) -> Self {
        Self::with_examples(threshold, &seed_examples())
    }

    pub fn with_examples(threshold: f64, examples: &[TrainingExample]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), threshold);

        write_dataset(&config.data.dataset_path, examples).unwrap();
        let model = train_model(&seed_examples(), &config.training.params()).unwrap();
        config.data.artifact_paths().save(&model).unwrap();
        let registry = Arc::new(ModelRegistry::from_trained(model));

        Self {
            dir,
            config,
            registry,
        }
    }

    pub fn retrainer(&self) -> Arc<Retrainer> {
        Arc::new(Retrainer::new(
            &self.config.data.dataset_path,
            self.config.data.artifact_paths(),
            self.config.training.params(),
            Arc::clone(&self.registry),
        ))
    }

    pub fn store(&self) -> LearningStore {
        LearningStore::new(&self.config.data.dataset_path, self.retrainer())
    }

    pub fn state(&self, oracle: Arc<dyn TextOracle>) -> AppState {
        AppState::new(self.config.clone(), Arc::clone(&self.registry), oracle)
    }
}
