//! WebAssembly module for the Crop Health Advisory platform
//!
//! Provides client-side computation for:
//! - Crop stage lookup
//! - Advisory previews from a known label
//! - Offline request normalization
//! - Weather summaries

use shared::FeatureRecord;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::advisory::*;
pub use shared::models::*;
pub use shared::validation::*;

fn parse_record(record_json: &str) -> Result<FeatureRecord, String> {
    serde_json::from_str(record_json).map_err(|e| format!("Invalid record JSON: {}", e))
}

fn normalize(request_json: &str) -> Result<String, String> {
    let payload: serde_json::Value =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request JSON: {}", e))?;
    let record = normalize_request(payload).map_err(|e| e.to_string())?;
    serde_json::to_string(&record).map_err(|e| e.to_string())
}

/// Crop stage name for elapsed days and lifecycle length
#[wasm_bindgen]
pub fn crop_stage_name(days_since_planting: u32, lifecycle: u32) -> String {
    crop_stage(days_since_planting, lifecycle).to_string()
}

/// Expected lifecycle length of a crop in days
#[wasm_bindgen]
pub fn crop_lifecycle_days(crop: &str) -> u32 {
    lifecycle_days(crop)
}

/// Build an advisory preview for a label and a feature record (JSON)
#[wasm_bindgen]
pub fn preview_advisory(label: &str, record_json: &str, variant: usize) -> Result<String, JsValue> {
    let record = parse_record(record_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(build_advisory(label, &record, variant))
}

/// Normalize a raw request (JSON) into a feature record (JSON)
#[wasm_bindgen]
pub fn normalize_suggest_request(request_json: &str) -> Result<String, JsValue> {
    normalize(request_json).map_err(|e| JsValue::from_str(&e))
}

/// Weather summary for a feature record (JSON)
#[wasm_bindgen]
pub fn summarize_weather(record_json: &str) -> Result<String, JsValue> {
    let record = parse_record(record_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(weather_summary(&record))
}
