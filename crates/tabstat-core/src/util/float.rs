//! Serde adapter that maps NaN to `null` and back.
//!
//! JSON has no NaN, and `serde_json` writes non-finite floats as `null` but
//! refuses to read `null` into an `f64`. Summary documents carry NaN whenever
//! the input contained malformed numbers, so they round-trip through this
//! adapter.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Summary {
//!     #[serde(with = "tabstat_core::util::float")]
//!     mean: f64,
//! }
//!
//! let back: Summary = serde_json::from_str(r#"{"mean": null}"#).unwrap();
//! assert!(back.mean.is_nan());
//! ```

use serde::{Deserialize, Deserializer, Serializer};

/// Serializes a float, writing NaN and infinities as `null`.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Deserializes a float, reading `null` as NaN.
///
/// # Errors
///
/// Fails when the value is neither a number nor `null`.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Same mapping for optional floats: absent stays `None`, `null` becomes NaN.
pub mod option {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `Some(x)` through the NaN-aware adapter.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.is_finite() => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }

    /// Deserializes a present value, mapping `null` to `Some(NaN)`.
    ///
    /// Pair with `#[serde(default)]` so that an absent key yields `None`.
    ///
    /// # Errors
    ///
    /// Fails when the value is neither a number nor `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(Some(
            Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN),
        ))
    }
}
