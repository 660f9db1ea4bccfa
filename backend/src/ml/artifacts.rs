//! On-disk model artifacts
//!
//! The classifier and the encoder are stored as two JSON files. Both are
//! staged in temporary siblings before either is renamed into place; if the
//! encoder cannot be published the previous classifier is put back, so the
//! pair on disk is always one that was trained together.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use super::encoder::CategoricalEncoder;
use super::forest::{ModelError, RandomForest};
use super::training::{TrainedModel, TrainingReport};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Artifact {path} is not valid: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize artifact {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Classifier expects {expected} features but the encoder produces {found}")]
    Mismatch { expected: usize, found: usize },

    #[error("Classifier artifact {path} is malformed: {source}")]
    Malformed { path: PathBuf, source: ModelError },
}

/// Serialized classifier with the report of the run that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub forest: RandomForest,
    pub report: TrainingReport,
}

/// Paths of the two artifact files
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoder: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, encoder: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            encoder: encoder.into(),
        }
    }

    /// Load both artifacts and check that they fit together
    pub fn load(&self) -> Result<(ClassifierArtifact, CategoricalEncoder), ArtifactError> {
        let classifier: ClassifierArtifact = read_json(&self.model)?;
        let encoder: CategoricalEncoder = read_json(&self.encoder)?;

        let found = encoder.columns().len() + 3;
        if classifier.forest.n_features() != found {
            return Err(ArtifactError::Mismatch {
                expected: classifier.forest.n_features(),
                found,
            });
        }
        classifier
            .forest
            .validate()
            .map_err(|source| ArtifactError::Malformed {
                path: self.model.clone(),
                source,
            })?;
        Ok((classifier, encoder))
    }

    /// Write both artifacts of a trained model.
    ///
    /// On error the previous pair is left in place.
    pub fn save(&self, model: &TrainedModel) -> Result<(), ArtifactError> {
        let classifier = ClassifierArtifact {
            forest: model.forest.clone(),
            report: model.report.clone(),
        };
        let model_bytes = to_json(&self.model, &classifier)?;
        let encoder_bytes = to_json(&self.encoder, &model.encoder)?;

        let staged_model = stage(&self.model, &model_bytes).map_err(|source| ArtifactError::Write {
            path: self.model.clone(),
            source,
        })?;
        let staged_encoder = match stage(&self.encoder, &encoder_bytes) {
            Ok(staged) => staged,
            Err(source) => {
                discard(&staged_model);
                return Err(ArtifactError::Write {
                    path: self.encoder.clone(),
                    source,
                });
            }
        };

        let previous_model = fs::read(&self.model).ok();
        if let Err(source) = fs::rename(&staged_model, &self.model) {
            discard(&staged_model);
            discard(&staged_encoder);
            return Err(ArtifactError::Write {
                path: self.model.clone(),
                source,
            });
        }
        if let Err(source) = fs::rename(&staged_encoder, &self.encoder) {
            discard(&staged_encoder);
            self.restore_model(previous_model);
            return Err(ArtifactError::Write {
                path: self.encoder.clone(),
                source,
            });
        }
        Ok(())
    }

    fn restore_model(&self, previous: Option<Vec<u8>>) {
        let restored = match previous {
            Some(bytes) => write_atomically(&self.model, &bytes),
            None => fs::remove_file(&self.model),
        };
        if let Err(e) = restored {
            tracing::error!(
                "Could not restore classifier artifact {}: {}",
                self.model.display(),
                e
            );
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn to_json<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>, ArtifactError> {
    serde_json::to_vec(value).map_err(|source| ArtifactError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `bytes` to the `.tmp` sibling of `path`, returning the sibling
fn stage(path: &Path, bytes: &[u8]) -> std::io::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    Ok(tmp)
}

fn discard(staged: &Path) {
    if let Err(e) = fs::remove_file(staged) {
        tracing::warn!("Could not remove staged file {}: {}", staged.display(), e);
    }
}

/// Write to a temporary sibling, then rename over the target
pub fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = stage(path, bytes)?;
    fs::rename(&tmp, path).map_err(|e| {
        discard(&tmp);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::training::{train_model, TrainingParams};
    use crate::ml::ForestParams;
    use shared::TrainingExample;
    use tempfile::tempdir;

    fn trained() -> TrainedModel {
        let examples: Vec<TrainingExample> = (0..10)
            .map(|i| TrainingExample {
                crop_name: if i % 2 == 0 { "rice" } else { "wheat" }.into(),
                location: "delta".into(),
                weather: "sunny".into(),
                soiltype: "clay".into(),
                temperature: 25.0,
                humidity: 50.0,
                rainfall: if i % 2 == 0 { 5.0 } else { 90.0 },
                label: if i % 2 == 0 { "stress" } else { "healthy" }.into(),
            })
            .collect();
        let params = TrainingParams {
            forest: ForestParams {
                n_estimators: 5,
                ..ForestParams::default()
            },
            validation_fraction: 0.2,
        };
        train_model(&examples, &params).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("model.json"), dir.path().join("enc.json"));
        let model = trained();

        paths.save(&model).unwrap();
        let (classifier, encoder) = paths.load().unwrap();

        assert_eq!(encoder, model.encoder);
        assert_eq!(classifier.report.rows, 10);
        assert_eq!(classifier.forest.classes(), model.forest.classes());
        assert!(!dir.path().join("model.json.tmp").exists());
    }

    #[test]
    fn test_unpublishable_encoder_keeps_previous_pair() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let encoder_path = dir.path().join("enc.json");
        let paths = ArtifactPaths::new(&model_path, &encoder_path);
        paths.save(&trained()).unwrap();
        let model_before = fs::read(&model_path).unwrap();

        // A non-empty directory cannot be replaced by a rename
        fs::remove_file(&encoder_path).unwrap();
        fs::create_dir(&encoder_path).unwrap();
        fs::write(encoder_path.join("keep"), b"x").unwrap();

        let mut other = trained();
        other.report.rows = 99;
        let result = paths.save(&other);

        assert!(matches!(result, Err(ArtifactError::Write { ref path, .. }) if *path == encoder_path));
        assert_eq!(fs::read(&model_path).unwrap(), model_before);
        assert!(!dir.path().join("model.json.tmp").exists());
        assert!(!dir.path().join("enc.json.tmp").exists());
    }

    #[test]
    fn test_malformed_forest_is_rejected_on_load() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("model.json"), dir.path().join("enc.json"));
        let model = trained();
        paths.save(&model).unwrap();

        let mut classifier: serde_json::Value =
            serde_json::from_slice(&fs::read(&paths.model).unwrap()).unwrap();
        classifier["forest"]["trees"] = serde_json::json!([{
            "kind": "split",
            "feature": 42,
            "threshold": 0.5,
            "left": {"kind": "leaf", "distribution": [1.0, 0.0]},
            "right": {"kind": "leaf", "distribution": [0.0, 1.0]}
        }]);
        fs::write(&paths.model, serde_json::to_vec(&classifier).unwrap()).unwrap();

        assert!(matches!(
            paths.load(),
            Err(ArtifactError::Malformed {
                source: ModelError::FeatureOutOfRange { index: 42, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_missing_artifact_is_read_error() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("none.json"), dir.path().join("enc.json"));
        assert!(matches!(paths.load(), Err(ArtifactError::Read { .. })));
    }

    #[test]
    fn test_corrupt_artifact_is_decode_error() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        fs::write(&model_path, b"not json").unwrap();
        let paths = ArtifactPaths::new(model_path, dir.path().join("enc.json"));
        assert!(matches!(paths.load(), Err(ArtifactError::Decode { .. })));
    }
}
