//! JSON utility functions for working with serde_json::Value.
//!
//! This module provides helper functions to safely extract typed values
//! from document bodies.

use serde_json::{Map, Number, Value};

/// Extract an f64 value from a JSON object by key.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tabstat_core::util::json::get_f64;
///
/// let body = json!({"Temperature (Mean)": 12.5});
/// assert_eq!(get_f64(&body, "Temperature (Mean)"), Some(12.5));
/// assert_eq!(get_f64(&body, "missing"), None);
/// ```
#[must_use]
pub fn get_f64(body: &Value, key: &str) -> Option<f64> {
    body.get(key).and_then(Value::as_f64)
}

/// Converts a float into a JSON value, mapping non-finite values to `null`.
///
/// # Examples
///
/// ```
/// use serde_json::Value;
/// use tabstat_core::util::json::finite_number;
///
/// assert_eq!(finite_number(-1.0), serde_json::json!(-1.0));
/// assert_eq!(finite_number(f64::NAN), Value::Null);
/// ```
#[must_use]
pub fn finite_number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Shallow-merges `patch` into `target`, overwriting existing keys.
pub fn merge_into(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
