//! Coercion of reviewer-edited form text back into typed values.

use serde_json::Value;

/// Interprets text typed into a review form.
///
/// Numeric text becomes a number (integers stay integers), the literals
/// `true` and `false` become booleans, and anything else is kept as the
/// original string.
pub fn coerce_form_value(input: &str) -> Value {
    let trimmed = input.trim();
    if !trimmed.is_empty() {
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::from(int);
        }
        if let Ok(float) = trimmed.parse::<f64>() {
            if float.is_finite() {
                return Value::from(float);
            }
        }
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(input.to_string()),
    }
}
