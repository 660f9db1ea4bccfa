//! Inbound advisory request mapping

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::record::{FeatureRecord, DEFAULT_FARMER_NAME, DEFAULT_WEATHER};
use crate::validation::{
    lowercase_payload, parse_day_count, parse_number, RequestError, REQUIRED_FIELDS,
};

/// A number sent either as JSON number or as a string
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn value(&self, field: &str) -> Result<f64, RequestError> {
        match self {
            NumericField::Number(n) => Ok(*n),
            NumericField::Text(raw) => parse_number(field, raw),
        }
    }
}

/// Case-folded advisory request as sent by clients
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SuggestRequest {
    #[validate(required, length(min = 1))]
    pub crop: Option<String>,
    #[validate(required, length(min = 1))]
    pub location: Option<String>,
    #[validate(required, length(min = 1))]
    pub soil: Option<String>,
    pub weather: Option<String>,
    pub temperature: Option<NumericField>,
    pub humidity: Option<NumericField>,
    pub rainfall: Option<NumericField>,
    pub farmer_name: Option<String>,
    pub days_since_planting: Option<NumericField>,
    pub lifecycle_days: Option<NumericField>,
}

impl SuggestRequest {
    /// Case-fold a raw JSON payload and deserialize it
    pub fn from_json(payload: Value) -> Result<Self, RequestError> {
        let object = lowercase_payload(payload)?;
        serde_json::from_value(Value::Object(object))
            .map_err(|e| RequestError::Malformed(e.to_string()))
    }

    /// Check required fields, reporting the first missing one
    pub fn check_required(&self) -> Result<(), RequestError> {
        if let Err(errors) = self.validate() {
            let field_errors = errors.field_errors();
            if let Some(field) = REQUIRED_FIELDS
                .iter()
                .find(|name| field_errors.contains_key(**name))
            {
                return Err(RequestError::MissingField(field.to_string()));
            }
            return Err(RequestError::Malformed(errors.to_string()));
        }
        Ok(())
    }

    /// Map the request into a feature record
    pub fn into_record(self) -> Result<FeatureRecord, RequestError> {
        self.check_required()?;

        let number = |field: &str, value: &Option<NumericField>| -> Result<f64, RequestError> {
            value.as_ref().map_or(Ok(0.0), |v| v.value(field))
        };
        let temperature = number("temperature", &self.temperature)?;
        let humidity = number("humidity", &self.humidity)?;
        let rainfall = number("rainfall", &self.rainfall)?;
        let days_since_planting = parse_day_count(
            "days_since_planting",
            number("days_since_planting", &self.days_since_planting)?,
        )?;
        let lifecycle_days = match &self.lifecycle_days {
            Some(value) => Some(parse_day_count("lifecycle_days", value.value("lifecycle_days")?)?)
                .filter(|days| *days > 0),
            None => None,
        };

        Ok(FeatureRecord {
            crop_name: self.crop.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            weather: self.weather.unwrap_or_else(|| DEFAULT_WEATHER.to_string()),
            soiltype: self.soil.unwrap_or_default(),
            temperature,
            humidity,
            rainfall,
            farmer_name: self.farmer_name.unwrap_or_else(|| DEFAULT_FARMER_NAME.to_string()),
            days_since_planting,
            lifecycle_days,
        })
    }
}

/// Normalize a raw JSON request into a feature record
pub fn normalize_request(payload: Value) -> Result<FeatureRecord, RequestError> {
    SuggestRequest::from_json(payload)?.into_record()
}
