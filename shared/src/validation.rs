//! Validation utilities for inbound advisory requests
//!
//! Requests arrive as loosely typed JSON. Keys and string values are
//! case-folded before mapping, numbers may be sent as strings.

use serde_json::{Map, Value};
use thiserror::Error;

/// Request keys that must be present and non-empty, in reporting order
pub const REQUIRED_FIELDS: [&str; 3] = ["crop", "location", "soil"];

/// Errors raised while normalizing an inbound request
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    #[error("No input data provided")]
    Empty,

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} must be a non-negative number, got {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl RequestError {
    /// Name of the offending field, when the error concerns one
    pub fn field(&self) -> Option<&str> {
        match self {
            RequestError::MissingField(field) => Some(field),
            RequestError::InvalidNumber { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Lower-case every key and every string value of a JSON object
pub fn lowercase_payload(payload: Value) -> Result<Map<String, Value>, RequestError> {
    let object = match payload {
        Value::Null => return Err(RequestError::Empty),
        Value::Object(object) => object,
        _ => return Err(RequestError::NotAnObject),
    };
    if object.is_empty() {
        return Err(RequestError::Empty);
    }

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other,
            };
            (key.to_lowercase(), value)
        })
        .collect())
}

/// Parse a numeric field sent either as a JSON number or a numeric string
pub fn parse_number(field: &str, raw: &str) -> Result<f64, RequestError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RequestError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Parse a day count; fractional values are truncated
pub fn parse_day_count(field: &str, value: f64) -> Result<u32, RequestError> {
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(RequestError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value as u32)
}
