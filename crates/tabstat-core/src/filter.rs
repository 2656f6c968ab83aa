//! Predicates over document bodies.
//!
//! Filters back the `scan_matching` primitive of a [`DocumentStore`]: the
//! missing-value scan and the compound query are both expressed as a
//! [`Filter`].
//!
//! ## Usage
//!
//! ```rust
//! use tabstat_core::filter::{Condition, Filter};
//! use serde_json::json;
//!
//! let filter = Filter::new(Condition::and(vec![
//!     Condition::gt("Specific conductance (Maximum)", 0.5),
//!     Condition::lt("pH, standard units (Maximum)", 1),
//! ]));
//!
//! let body = json!({"Specific conductance (Maximum)": 0.9, "pH, standard units (Maximum)": 0.2});
//! assert!(filter.matches(&body));
//! ```
//!
//! [`DocumentStore`]: crate::store::DocumentStore

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A filter over document bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    /// The root condition of the filter.
    pub condition: Condition,
}

impl Filter {
    /// Creates a new filter with the given condition.
    #[must_use]
    pub fn new(condition: Condition) -> Self {
        Self { condition }
    }

    /// Returns `true` if the body matches the filter conditions.
    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        self.condition.matches(body)
    }

    /// Matches a body held as a JSON object map.
    #[must_use]
    pub fn matches_body(&self, body: &serde_json::Map<String, Value>) -> bool {
        self.condition.matches_map(body)
    }
}

/// A condition on one or more fields.
///
/// Field names are matched literally; column names such as
/// `"pH, standard units (Maximum)"` contain punctuation, so no path syntax is
/// interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Equality comparison: field == value
    Eq {
        /// Field name
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Greater than comparison: field > value
    Gt {
        /// Field name
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Greater than or equal comparison: field >= value
    Gte {
        /// Field name
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Less than comparison: field < value
    Lt {
        /// Field name
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Less than or equal comparison: field <= value
    Lte {
        /// Field name
        field: String,
        /// Value to compare against
        value: Value,
    },
    /// Field is absent or null
    IsMissing {
        /// Field name
        field: String,
    },
    /// Logical AND of multiple conditions
    And {
        /// Conditions to AND together
        conditions: Vec<Condition>,
    },
    /// Logical OR of multiple conditions
    Or {
        /// Conditions to OR together
        conditions: Vec<Condition>,
    },
    /// Logical NOT of a condition
    Not {
        /// Condition to negate
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Creates an equality condition.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a greater-than condition.
    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a greater-than-or-equal condition.
    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a less-than condition.
    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a less-than-or-equal condition.
    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an is-missing condition (absent or null).
    #[must_use]
    pub fn is_missing(field: impl Into<String>) -> Self {
        Self::IsMissing {
            field: field.into(),
        }
    }

    /// Creates an AND condition combining multiple conditions.
    #[must_use]
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::And { conditions }
    }

    /// Creates an OR condition combining multiple conditions.
    #[must_use]
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::Or { conditions }
    }

    /// Creates a NOT condition negating another condition.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    /// Evaluates the condition against a JSON value (non-objects match
    /// nothing but `IsMissing`).
    #[must_use]
    pub fn matches(&self, body: &Value) -> bool {
        match body.as_object() {
            Some(map) => self.matches_map(map),
            None => self.matches_map(&serde_json::Map::new()),
        }
    }

    /// Evaluates the condition against a JSON object.
    #[must_use]
    pub fn matches_map(&self, body: &serde_json::Map<String, Value>) -> bool {
        match self {
            Self::Eq { field, value } => body.get(field).is_some_and(|v| values_equal(v, value)),
            Self::Gt { field, value } => {
                compare_field(body, field, value).is_some_and(Ordering::is_gt)
            }
            Self::Gte { field, value } => {
                compare_field(body, field, value).is_some_and(Ordering::is_ge)
            }
            Self::Lt { field, value } => {
                compare_field(body, field, value).is_some_and(Ordering::is_lt)
            }
            Self::Lte { field, value } => {
                compare_field(body, field, value).is_some_and(Ordering::is_le)
            }
            Self::IsMissing { field } => body.get(field).is_none_or(Value::is_null),
            Self::And { conditions } => conditions.iter().all(|c| c.matches_map(body)),
            Self::Or { conditions } => conditions.iter().any(|c| c.matches_map(body)),
            Self::Not { condition } => !condition.matches_map(body),
        }
    }
}

fn compare_field(
    body: &serde_json::Map<String, Value>,
    field: &str,
    value: &Value,
) -> Option<Ordering> {
    body.get(field).and_then(|v| compare_values(v, value))
}

/// Compares two JSON values for equality.
///
/// Numbers compare by exact `f64` value, so `1` equals `1.0`. Range
/// comparisons use the same ordering.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => {
            compare_values(a, b).is_some_and(Ordering::is_eq)
        }
        _ => a == b,
    }
}

/// Orders two JSON values of the same scalar type; `None` when incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
