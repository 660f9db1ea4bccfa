//! Local classification model: categorical encoding, random forest,
//! stratified training and on-disk artifacts

pub mod artifacts;
pub mod encoder;
pub mod forest;
pub mod split;
pub mod training;

pub use artifacts::{ArtifactError, ArtifactPaths, ClassifierArtifact};
pub use encoder::{CategoricalEncoder, EncoderError};
pub use forest::{ForestParams, ModelError, Prediction, RandomForest};
pub use split::{stratified_split, SplitError};
pub use training::{train_model, TrainedModel, TrainingError, TrainingParams, TrainingReport};
