//! Training dataset rows

use serde::{Deserialize, Serialize};

/// Column order of the persisted dataset
pub const DATASET_COLUMNS: [&str; 8] = [
    "crop_name",
    "location",
    "weather",
    "soiltype",
    "temperature",
    "humidity",
    "rainfall",
    "label",
];

/// One labelled row of the training dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingExample {
    pub crop_name: String,
    pub location: String,
    pub weather: String,
    pub soiltype: String,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub label: String,
}

impl TrainingExample {
    /// Categorical columns in encoder order
    pub fn categorical(&self) -> [&str; 4] {
        [&self.crop_name, &self.location, &self.weather, &self.soiltype]
    }

    /// Numeric columns in feature order
    pub fn numeric(&self) -> [f64; 3] {
        [self.temperature, self.humidity, self.rainfall]
    }

    /// Whether both rows describe the same observation.
    ///
    /// Rows match on crop, location, temperature, humidity and rainfall.
    /// Weather, soil type and label are not compared.
    pub fn same_observation(&self, other: &TrainingExample) -> bool {
        self.crop_name == other.crop_name
            && self.location == other.location
            && self.temperature == other.temperature
            && self.humidity == other.humidity
            && self.rainfall == other.rainfall
    }
}

/// Whether `dataset` already holds a row for the observation in `example`
pub fn contains_observation(dataset: &[TrainingExample], example: &TrainingExample) -> bool {
    dataset.iter().any(|row| row.same_observation(example))
}
