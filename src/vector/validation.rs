//! Embedding shape and content checks.
//!
//! These run on every vector before it is handed to a backend, so malformed
//! input is rejected locally instead of surfacing as an opaque backend error.

use serde_json::Value;

use crate::error::{PrismError, Result};

/// Check that `vector` has exactly `expected` finite components.
pub fn validate_dimensions(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(PrismError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(PrismError::invalid_embedding_values(format!(
            "component {pos} is {}",
            vector[pos]
        )));
    }
    Ok(())
}

/// Validate a dynamically typed embedding, e.g. one read from JSON.
///
/// Anything that is not an array is an [`PrismError::InvalidEmbeddingType`].
/// The length is checked before the components, so a short array holding a
/// string reports a dimension mismatch.
pub fn validate_embedding_value(value: &Value, expected: usize) -> Result<()> {
    let items = value.as_array().ok_or_else(|| {
        PrismError::invalid_embedding_type(format!(
            "expected an array of numbers, got {}",
            json_type_name(value)
        ))
    })?;

    if items.len() != expected {
        return Err(PrismError::DimensionMismatch {
            expected,
            actual: items.len(),
        });
    }

    for (pos, item) in items.iter().enumerate() {
        match item.as_f64() {
            Some(v) if v.is_finite() => {}
            Some(v) => {
                return Err(PrismError::invalid_embedding_values(format!(
                    "component {pos} is {v}"
                )));
            }
            None => {
                return Err(PrismError::invalid_embedding_values(format!(
                    "component {pos} is a {}, not a number",
                    json_type_name(item)
                )));
            }
        }
    }
    Ok(())
}

/// Convert a JSON embedding into a vector after validating it.
pub fn embedding_from_value(value: &Value, expected: usize) -> Result<Vec<f32>> {
    validate_embedding_value(value, expected)?;
    let vector: Vec<f32> = value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_f64).map(|v| v as f32).collect())
        .unwrap_or_default();
    // f64 values outside the f32 range become infinite.
    validate_dimensions(&vector, expected)?;
    Ok(vector)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
