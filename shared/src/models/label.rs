//! Prediction labels and advisory intents

use serde::{Deserialize, Serialize};

/// Crop health labels requested from the remote oracle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HealthLabel {
    Healthy,
    Moderate,
    Stress,
}

impl HealthLabel {
    pub const ALL: [HealthLabel; 3] = [HealthLabel::Healthy, HealthLabel::Moderate, HealthLabel::Stress];

    pub const fn as_str(&self) -> &'static str {
        match self {
            HealthLabel::Healthy => "healthy",
            HealthLabel::Moderate => "moderate",
            HealthLabel::Stress => "stress",
        }
    }

    /// Labels joined with `|`, as shown to the oracle
    pub fn choices() -> String {
        HealthLabel::ALL.map(|label| label.as_str()).join("|")
    }
}

impl std::fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advisory intent tags the template engine knows how to phrase.
///
/// Classifier labels outside this set (including the health labels) are
/// phrased as `NormalMonitor`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryIntent {
    IrrigationNeeded,
    ReduceIrrigation,
    Fertilizer,
    PestMonitor,
    WeedControl,
    NormalMonitor,
}

impl AdvisoryIntent {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "irrigation_needed" => AdvisoryIntent::IrrigationNeeded,
            "reduce_irrigation" => AdvisoryIntent::ReduceIrrigation,
            "fertilizer" => AdvisoryIntent::Fertilizer,
            "pest_monitor" => AdvisoryIntent::PestMonitor,
            "weed_control" => AdvisoryIntent::WeedControl,
            _ => AdvisoryIntent::NormalMonitor,
        }
    }

    /// Fertilizer and weed-control messages already carry stage guidance
    pub fn embeds_stage_guidance(&self) -> bool {
        matches!(self, AdvisoryIntent::Fertilizer | AdvisoryIntent::WeedControl)
    }
}

impl std::fmt::Display for AdvisoryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdvisoryIntent::IrrigationNeeded => write!(f, "irrigation_needed"),
            AdvisoryIntent::ReduceIrrigation => write!(f, "reduce_irrigation"),
            AdvisoryIntent::Fertilizer => write!(f, "fertilizer"),
            AdvisoryIntent::PestMonitor => write!(f, "pest_monitor"),
            AdvisoryIntent::WeedControl => write!(f, "weed_control"),
            AdvisoryIntent::NormalMonitor => write!(f, "normal_monitor"),
        }
    }
}
