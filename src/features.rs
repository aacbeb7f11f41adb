//! Feature record validation and assembly
//!
//! A prediction request carries exactly twelve numeric health-survey
//! fields. This module owns the canonical field order (the order the
//! scaler was fitted on), the missing-field check that runs before any
//! transform, and the extraction of a fixed-size feature vector from a
//! JSON payload.

use crate::error::{DiascreenError, Result};
use serde_json::{Map, Value};

/// Number of features the scaler and classifier were fitted on
pub const FEATURE_COUNT: usize = 12;

/// Canonical field names in fit order
///
/// The scaler and classifier artifacts were fitted against columns in this
/// exact order; feature vectors must be assembled to match.
pub const EXPECTED_FIELDS: [&str; FEATURE_COUNT] = [
    "HighBP",
    "HighChol",
    "BMI",
    "Smoker",
    "Stroke",
    "HeartDiseaseorAttack",
    "PhysActivity",
    "Fruits",
    "Veggies",
    "HvyAlcoholConsump",
    "Sex",
    "Age",
];

/// A validated, ordered feature vector ready for scaling
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: [f64; FEATURE_COUNT],
}

impl FeatureRecord {
    /// Builds a feature record from a JSON payload object
    ///
    /// Validation happens in two stages, matching the service's error
    /// contract:
    ///
    /// 1. Every expected field name must be a key in the payload. Missing
    ///    keys produce a [`DiascreenError::Validation`] listing exactly the
    ///    absent names in canonical order (HTTP 400).
    /// 2. Every present value must be a JSON number. A non-numeric value
    ///    fails the transform stage with a [`DiascreenError::Inference`]
    ///    naming the offending field (HTTP 500).
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self> {
        let missing: Vec<&'static str> = EXPECTED_FIELDS
            .iter()
            .filter(|field| !payload.contains_key(**field))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(DiascreenError::missing_fields(missing));
        }

        let mut values = [0.0_f64; FEATURE_COUNT];
        for (i, field) in EXPECTED_FIELDS.iter().enumerate() {
            // Key presence was checked above.
            let value = &payload[*field];
            values[i] = value.as_f64().ok_or_else(|| {
                DiascreenError::inference(format!(
                    "field '{}' must be numeric, got {}",
                    field,
                    type_name(value)
                ))
            })?;
        }

        Ok(FeatureRecord { values })
    }

    /// Returns the ordered raw feature values
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
