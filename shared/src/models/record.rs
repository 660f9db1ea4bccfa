//! Field observation records

use serde::{Deserialize, Serialize};

use super::crop::lifecycle_days;
use super::training::TrainingExample;

pub const DEFAULT_WEATHER: &str = "unknown";
pub const DEFAULT_FARMER_NAME: &str = "farmer";

fn default_weather() -> String {
    DEFAULT_WEATHER.to_string()
}

fn default_farmer_name() -> String {
    DEFAULT_FARMER_NAME.to_string()
}

/// A single normalized field observation submitted for advice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    pub crop_name: String,
    pub location: String,
    #[serde(default = "default_weather")]
    pub weather: String,
    pub soiltype: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub rainfall: f64,
    #[serde(default = "default_farmer_name")]
    pub farmer_name: String,
    /// Days elapsed since the crop was planted
    #[serde(default)]
    pub days_since_planting: u32,
    /// Explicit lifecycle length; the crop table is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_days: Option<u32>,
}

impl FeatureRecord {
    pub fn new(
        crop_name: impl Into<String>,
        location: impl Into<String>,
        soiltype: impl Into<String>,
    ) -> Self {
        Self {
            crop_name: crop_name.into(),
            location: location.into(),
            weather: default_weather(),
            soiltype: soiltype.into(),
            temperature: 0.0,
            humidity: 0.0,
            rainfall: 0.0,
            farmer_name: default_farmer_name(),
            days_since_planting: 0,
            lifecycle_days: None,
        }
    }

    /// Lifecycle length used for stage calculation
    pub fn resolved_lifecycle_days(&self) -> u32 {
        match self.lifecycle_days {
            Some(days) if days > 0 => days,
            _ => lifecycle_days(&self.crop_name),
        }
    }

    /// Build the training row recorded once a label has been resolved
    pub fn to_training_example(&self, label: impl Into<String>) -> TrainingExample {
        TrainingExample {
            crop_name: self.crop_name.clone(),
            location: self.location.clone(),
            weather: self.weather.clone(),
            soiltype: self.soiltype.clone(),
            temperature: self.temperature,
            humidity: self.humidity,
            rainfall: self.rainfall,
            label: label.into(),
        }
    }
}
